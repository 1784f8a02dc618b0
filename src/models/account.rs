//! 账户模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 已注册的账户
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub username: String,
    pub email: String,
    /// 邮箱是否已通过 OTP 验证
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(username: &str, email: &str) -> Self {
        Self {
            username: username.to_string(),
            email: email.to_string(),
            verified: false,
            created_at: Utc::now(),
        }
    }
}

/// 外发邮件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}
