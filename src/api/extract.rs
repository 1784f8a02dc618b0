//! 自定义提取器

use axum::extract::FromRequest;

use crate::error::AppError;

/// JSON 请求体；解析失败时返回 `MalformedRequest` 而不是 axum 默认的 422
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);
