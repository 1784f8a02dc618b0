//! DTO 模块
//!
//! 数据传输对象，用于 API 请求和响应的序列化。

pub mod account_dto;
pub mod book_dto;
pub mod otp_dto;

pub use account_dto::*;
pub use book_dto::*;
pub use otp_dto::*;
