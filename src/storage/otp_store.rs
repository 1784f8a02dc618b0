//! OTP 存储
//!
//! 用户名到 `OtpRecord` 的内存映射。单条记录的读写由 DashMap 分片锁保证原子性；
//! 跨多步的状态转换（签发、验证）由 `OtpLifecycleManager` 持有的用户锁串行化。

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use crate::models::otp::OtpRecord;

/// 内存 OTP 存储
#[derive(Debug, Default)]
pub struct OtpStore {
    records: DashMap<String, OtpRecord>,
}

impl OtpStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入或替换记录，返回被替换的旧记录
    pub fn upsert(&self, record: OtpRecord) -> Option<OtpRecord> {
        self.records.insert(record.username.clone(), record)
    }

    /// 读取记录副本
    pub fn get(&self, username: &str) -> Option<OtpRecord> {
        self.records.get(username).map(|r| r.value().clone())
    }

    /// 删除记录
    pub fn delete(&self, username: &str) -> Option<OtpRecord> {
        self.records.remove(username).map(|(_, record)| record)
    }

    /// 失败次数加一，返回新的失败次数；记录不存在时返回 None
    pub fn record_failure(&self, username: &str) -> Option<u32> {
        self.records.get_mut(username).map(|mut r| {
            r.failed_attempts += 1;
            r.failed_attempts
        })
    }

    /// 删除所有过期记录，返回删除数量
    pub fn purge_expired(&self, ttl: Duration, now: DateTime<Utc>) -> usize {
        let before = self.records.len();
        self.records.retain(|_, r| !r.is_expired(ttl, now));
        before.saturating_sub(self.records.len())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_replaces_previous_record() {
        let store = OtpStore::new();
        assert!(store.upsert(OtpRecord::new("alice", "111111")).is_none());

        let previous = store.upsert(OtpRecord::new("alice", "222222")).unwrap();
        assert_eq!(previous.code, "111111");
        assert_eq!(store.get("alice").unwrap().code, "222222");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_record_failure_counts_until_deleted() {
        let store = OtpStore::new();
        store.upsert(OtpRecord::new("bob", "123456"));

        assert_eq!(store.record_failure("bob"), Some(1));
        assert_eq!(store.record_failure("bob"), Some(2));
        assert!(store.delete("bob").is_some());
        assert_eq!(store.record_failure("bob"), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_purge_only_removes_expired() {
        let store = OtpStore::new();
        let now = Utc::now();
        store.upsert(OtpRecord::issued_at("old", "1", now - Duration::minutes(20)));
        store.upsert(OtpRecord::issued_at("new", "2", now - Duration::minutes(1)));

        assert_eq!(store.purge_expired(Duration::minutes(10), now), 1);
        assert!(store.get("old").is_none());
        assert!(store.get("new").is_some());
    }
}
