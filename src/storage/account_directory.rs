//! 账户目录
//!
//! OTP 流程只需要按用户名查询账户以及把账户标记为已验证。
//! 账户的持久化不在本服务范围内，这里提供一个内存实现。

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::error::{AppError, Result};
use crate::models::account::Account;

/// 账户目录 trait
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// 根据用户名查找账户
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>>;

    /// 标记账户邮箱已验证
    async fn mark_verified(&self, username: &str) -> Result<()>;

    /// 注册新账户
    async fn register(&self, username: &str, email: &str) -> Result<Account>;
}

/// 内存账户目录
#[derive(Debug, Default)]
pub struct InMemoryAccountDirectory {
    accounts: DashMap<String, Account>,
}

impl InMemoryAccountDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// 使用预置账户创建目录
    pub fn with_accounts<I, S>(accounts: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: AsRef<str>,
    {
        let directory = Self::new();
        for (username, email) in accounts {
            let (username, email) = (username.as_ref(), email.as_ref());
            directory
                .accounts
                .insert(username.to_string(), Account::new(username, email));
        }
        directory
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[async_trait]
impl AccountDirectory for InMemoryAccountDirectory {
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>> {
        Ok(self.accounts.get(username).map(|a| a.value().clone()))
    }

    async fn mark_verified(&self, username: &str) -> Result<()> {
        match self.accounts.get_mut(username) {
            Some(mut account) => {
                account.verified = true;
                Ok(())
            }
            None => Err(AppError::UnknownUser(username.to_string())),
        }
    }

    async fn register(&self, username: &str, email: &str) -> Result<Account> {
        match self.accounts.entry(username.to_string()) {
            Entry::Occupied(_) => Err(AppError::Conflict(format!(
                "username '{}' is already registered",
                username
            ))),
            Entry::Vacant(slot) => {
                let account = Account::new(username, email);
                slot.insert(account.clone());
                Ok(account)
            }
        }
    }
}
