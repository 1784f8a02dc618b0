//! Security Module
//!
//! Security features for the ShelfQuest API:
//! - Rate Limiting (OTP endpoints)
//! - Request Validation
//! - Security Middleware

pub mod middleware;
pub mod rate_limit;
pub mod validation;

pub use rate_limit::{RateLimitResult, RateLimiter};
pub use validation::{RequestValidator, ValidationError};
