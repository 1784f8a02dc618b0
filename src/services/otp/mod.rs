//! OTP 生命周期管理
//!
//! 每个用户名的状态机：`NONE -> ACTIVE -> (VERIFIED | EXPIRED | REPLACED) -> NONE`。
//! 同一用户名的签发与验证在该用户名的锁内串行执行，不同用户名互不影响。
//!
//! 签发时先发送邮件，发送成功后才写入记录；发送失败时状态保持不变，
//! 之前的有效验证码依旧可用。过期在验证时惰性检查，另有可选的后台清理任务。

pub mod code;

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::config::{MAX_OTP_TTL_SECS, OtpConfig};
use crate::error::{AppError, Result};
use crate::models::account::EmailMessage;
use crate::models::otp::OtpRecord;
use crate::storage::{AccountDirectory, KeyedLocks, OtpStore};

pub use code::{CodeGenerator, codes_match};

use crate::services::notification::NotificationGateway;

/// OTP 策略
#[derive(Debug, Clone)]
pub struct OtpPolicy {
    /// 有效期
    pub ttl: Duration,
    /// 验证码位数
    pub code_length: u32,
    /// 最大错误次数
    pub max_attempts: u32,
    /// 邮件主题
    pub email_subject: String,
}

impl Default for OtpPolicy {
    fn default() -> Self {
        Self::from(&OtpConfig::default())
    }
}

impl From<&OtpConfig> for OtpPolicy {
    fn from(config: &OtpConfig) -> Self {
        Self {
            ttl: Duration::seconds(config.ttl_secs.min(MAX_OTP_TTL_SECS) as i64),
            code_length: config.code_length,
            max_attempts: config.max_attempts.max(1),
            email_subject: config.email_subject.clone(),
        }
    }
}

/// 签发结果，不包含验证码本身
#[derive(Debug, Clone, PartialEq)]
pub struct IssuedOtp {
    pub username: String,
    pub email: String,
    pub expires_at: DateTime<Utc>,
    /// 是否替换了之前仍有效的验证码
    pub replaced: bool,
}

/// 验证邮件正文
pub fn verification_body(code: &str) -> String {
    format!(
        "To verify your email address, please use the following One Time Password (OTP):\n\n{}",
        code
    )
}

/// OTP 生命周期管理器
pub struct OtpLifecycleManager {
    store: OtpStore,
    locks: KeyedLocks,
    accounts: Arc<dyn AccountDirectory>,
    notifier: Arc<dyn NotificationGateway>,
    generator: CodeGenerator,
    policy: OtpPolicy,
}

impl OtpLifecycleManager {
    pub fn new(
        accounts: Arc<dyn AccountDirectory>,
        notifier: Arc<dyn NotificationGateway>,
        policy: OtpPolicy,
    ) -> Self {
        Self {
            store: OtpStore::new(),
            locks: KeyedLocks::new(),
            accounts,
            notifier,
            generator: CodeGenerator::new(policy.code_length),
            policy,
        }
    }

    /// 为已注册用户签发验证码并发送到邮箱，替换该用户之前的验证码
    pub async fn issue(&self, username: &str, email: &str) -> Result<IssuedOtp> {
        let username = username.trim();
        let email = email.trim();
        if username.is_empty() {
            return Err(AppError::MalformedRequest("username is required".to_string()));
        }
        if email.is_empty() {
            return Err(AppError::MalformedRequest("email is required".to_string()));
        }

        if self.accounts.find_by_username(username).await?.is_none() {
            return Err(AppError::UnknownUser(username.to_string()));
        }

        let code = self.generator.generate()?;
        let _guard = self.locks.lock(username).await;

        let message = EmailMessage {
            to: email.to_string(),
            subject: self.policy.email_subject.clone(),
            body: verification_body(&code),
        };
        if let Err(e) = self.notifier.send(&message).await {
            warn!(username = %username, "OTP not issued, email delivery failed: {}", e);
            return Err(e);
        }

        let record = OtpRecord::new(username, &code);
        let expires_at = record.expires_at(self.policy.ttl);
        let replaced = self.store.upsert(record).is_some();

        info!(username = %username, replaced, "OTP issued");

        Ok(IssuedOtp {
            username: username.to_string(),
            email: email.to_string(),
            expires_at,
            replaced,
        })
    }

    /// 验证用户提交的验证码；成功后验证码作废并标记账户已验证
    pub async fn verify(&self, username: &str, submitted: &str) -> Result<()> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AppError::MalformedRequest("username is required".to_string()));
        }
        if submitted.trim().is_empty() {
            return Err(AppError::MalformedRequest("otp is required".to_string()));
        }

        let _guard = self.locks.lock(username).await;

        let record = self.store.get(username).ok_or(AppError::InvalidOtp)?;

        if record.is_expired(self.policy.ttl, Utc::now()) {
            self.store.delete(username);
            debug!(username = %username, "Expired OTP discarded");
            return Err(AppError::InvalidOtp);
        }

        if !codes_match(&record.code, submitted) {
            let attempts = self
                .store
                .record_failure(username)
                .unwrap_or(record.failed_attempts + 1);
            if attempts >= self.policy.max_attempts {
                self.store.delete(username);
                warn!(username = %username, attempts, "OTP revoked after too many failed attempts");
            }
            return Err(AppError::IncorrectOtp);
        }

        self.accounts.mark_verified(username).await?;
        self.store.delete(username);

        info!(username = %username, "OTP verified, account marked as verified");
        Ok(())
    }

    /// 删除所有过期记录
    pub fn purge_expired(&self) -> usize {
        let removed = self.store.purge_expired(self.policy.ttl, Utc::now());
        if removed > 0 {
            debug!(removed, "Purged expired OTPs");
        }
        removed
    }

    /// 启动后台过期清理任务
    pub fn spawn_expiry_sweeper(
        manager: Arc<Self>,
        period: std::time::Duration,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // 第一次 tick 立即返回
            ticker.tick().await;
            loop {
                ticker.tick().await;
                manager.purge_expired();
            }
        })
    }

    pub fn store(&self) -> &OtpStore {
        &self.store
    }

    pub fn policy(&self) -> &OtpPolicy {
        &self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_ttl_is_capped() {
        let config = OtpConfig {
            ttl_secs: u64::MAX,
            ..OtpConfig::default()
        };
        let policy = OtpPolicy::from(&config);
        assert_eq!(policy.ttl, Duration::seconds(MAX_OTP_TTL_SECS as i64));

        assert_eq!(OtpPolicy::default().ttl, Duration::seconds(600));
    }
}
