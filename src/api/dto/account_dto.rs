//! 账户 DTO

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::account::Account;

/// 注册请求
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterAccountRequest {
    pub username: String,
    pub email: String,
}

/// 账户响应
#[derive(Debug, Serialize, Deserialize)]
pub struct AccountResponse {
    pub username: String,
    pub email: String,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            username: account.username,
            email: account.email,
            verified: account.verified,
            created_at: account.created_at,
        }
    }
}
