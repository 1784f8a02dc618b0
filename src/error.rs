//! 错误处理模块
//!
//! 定义应用程序的错误类型以及到 HTTP 响应的映射。

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::security::validation::ValidationError;

/// 应用程序错误类型
#[derive(Error, Debug)]
pub enum AppError {
    /// 缓存中没有该类型的书籍
    #[error("{0} not found in cache")]
    GenreNotCached(String),

    /// 用户尚未注册
    #[error("An OTP could not be sent as user '{0}' is not yet registered.")]
    UnknownUser(String),

    /// 没有有效的 OTP（从未签发、已使用或已过期）
    #[error("There is no active OTP for this user. Please request a new one.")]
    InvalidOtp,

    /// OTP 不匹配，原 OTP 仍然有效
    #[error("The OTP provided is incorrect.")]
    IncorrectOtp,

    /// 请求缺少必填字段或格式错误
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// 资源不存在
    #[error("Not found: {0}")]
    NotFound(String),

    /// 资源冲突
    #[error("Conflict: {0}")]
    Conflict(String),

    /// 速率限制
    #[error("Too many requests, please try again later.")]
    RateLimited,

    /// 外部服务（书籍 API、邮件服务）不可用
    #[error("Upstream service failure: {0}")]
    Upstream(String),

    /// 配置错误
    #[error("Configuration error: {0}")]
    Config(String),

    /// 序列化错误
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO 错误
    #[error("IO error: {0}")]
    Io(String),

    /// 内部错误
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Serialization(e.to_string())
    }
}

impl From<figment::Error> for AppError {
    fn from(e: figment::Error) -> Self {
        AppError::Config(e.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AppError::Upstream(format!("request timed out: {}", e))
        } else {
            AppError::Upstream(e.to_string())
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::MalformedRequest(rejection.body_text())
    }
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::MalformedRequest(e.to_string())
    }
}

/// Axum response implementation for AppError
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = (&self).into();
        let body = Json(ErrorResponse::new(&code, &self.to_string()));
        (
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body,
        )
            .into_response()
    }
}

/// 错误响应
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// 错误消息
    pub error: String,
    /// 错误代码
    pub code: String,
    /// 详细信息
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    /// 创建新错误响应
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            error: message.to_string(),
            code: code.to_string(),
            details: None,
        }
    }

    /// 添加详细信息
    pub fn with_details(mut self, details: &str) -> Self {
        self.details = Some(details.to_string());
        self
    }
}

impl AppError {
    /// 带详细信息的响应，用于上游错误等需要附加上下文的场景
    pub fn into_response_with_details(self, details: &str) -> Response {
        let (status, code) = (&self).into();
        let body = Json(ErrorResponse::new(&code, &self.to_string()).with_details(details));
        (
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body,
        )
            .into_response()
    }
}

/// HTTP 状态码映射
impl From<&AppError> for (u16, String) {
    fn from(err: &AppError) -> (u16, String) {
        match err {
            AppError::GenreNotCached(_) => (404, "GENRE_NOT_CACHED".to_string()),
            AppError::UnknownUser(_) => (404, "UNKNOWN_USER".to_string()),
            AppError::InvalidOtp => (400, "INVALID_OTP".to_string()),
            AppError::IncorrectOtp => (401, "INCORRECT_OTP".to_string()),
            AppError::MalformedRequest(_) => (400, "MALFORMED_REQUEST".to_string()),
            AppError::NotFound(_) => (404, "NOT_FOUND".to_string()),
            AppError::Conflict(_) => (409, "CONFLICT".to_string()),
            AppError::RateLimited => (429, "RATE_LIMITED".to_string()),
            AppError::Upstream(_) => (502, "UPSTREAM_ERROR".to_string()),
            _ => (500, "INTERNAL_ERROR".to_string()),
        }
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, AppError>;
