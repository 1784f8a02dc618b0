//! Handlers 模块
//!
//! HTTP 请求处理程序。

pub mod account_handler;
pub mod book_handler;
pub mod otp_handler;

pub use account_handler::*;
pub use book_handler::*;
pub use otp_handler::*;
