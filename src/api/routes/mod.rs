//! Routes 模块
//!
//! 定义 API 路由。

pub mod account_routes;
pub mod book_routes;
pub mod otp_routes;
