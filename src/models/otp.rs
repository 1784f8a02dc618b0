//! OTP 记录模型

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// 某个用户当前有效的 OTP
///
/// 每个用户名最多一条；重新签发会整体替换旧记录。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtpRecord {
    /// 用户名（唯一键）
    pub username: String,
    /// 验证码
    pub code: String,
    /// 签发时间
    pub issued_at: DateTime<Utc>,
    /// 已失败的验证次数
    pub failed_attempts: u32,
}

impl OtpRecord {
    /// 创建新记录，签发时间为当前时间
    pub fn new(username: &str, code: &str) -> Self {
        Self::issued_at(username, code, Utc::now())
    }

    /// 使用指定签发时间创建记录
    pub fn issued_at(username: &str, code: &str, issued_at: DateTime<Utc>) -> Self {
        Self {
            username: username.to_string(),
            code: code.to_string(),
            issued_at,
            failed_attempts: 0,
        }
    }

    /// 记录年龄
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.issued_at
    }

    /// 年龄超过 ttl 即视为过期
    pub fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        self.age(now) > ttl
    }

    /// 过期时间点
    pub fn expires_at(&self, ttl: Duration) -> DateTime<Utc> {
        self.issued_at + ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_boundary() {
        let now = Utc::now();
        let ttl = Duration::seconds(60);

        let fresh = OtpRecord::issued_at("alice", "123456", now - Duration::seconds(59));
        let edge = OtpRecord::issued_at("alice", "123456", now - Duration::seconds(60));
        let stale = OtpRecord::issued_at("alice", "123456", now - Duration::seconds(61));

        assert!(!fresh.is_expired(ttl, now));
        assert!(!edge.is_expired(ttl, now));
        assert!(stale.is_expired(ttl, now));
        assert_eq!(fresh.expires_at(ttl), now + Duration::seconds(1));
    }
}
