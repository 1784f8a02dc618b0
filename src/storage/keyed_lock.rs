//! 按键加锁
//!
//! 每个键对应一把 `tokio::sync::Mutex`，按需创建，最后一个持有者释放后移除。
//! 不同键之间互不阻塞。

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Default)]
pub struct KeyedLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取某个键的锁，等待其他持有者释放
    pub async fn lock(&self, key: &str) -> KeyedGuard<'_> {
        let mutex = self.locks.entry(key.to_string()).or_default().clone();
        let guard = mutex.lock_owned().await;
        KeyedGuard {
            owner: self,
            key: key.to_string(),
            guard: Some(guard),
        }
    }

    /// 当前存在的锁数量
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// 锁守卫，Drop 时释放锁并在无人等待时清理
pub struct KeyedGuard<'a> {
    owner: &'a KeyedLocks,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyedGuard<'_> {
    fn drop(&mut self) {
        // 先释放守卫持有的 Arc，计数为 1 时只剩映射本身
        drop(self.guard.take());
        self.owner
            .locks
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_lock_is_removed_after_release() {
        let locks = KeyedLocks::new();
        {
            let _guard = locks.lock("alice").await;
            assert_eq!(locks.len(), 1);
        }
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_different_keys_do_not_block() {
        let locks = KeyedLocks::new();
        let _alice = locks.lock("alice").await;

        let bob = tokio::time::timeout(Duration::from_millis(100), locks.lock("bob")).await;
        assert!(bob.is_ok());
    }

    #[tokio::test]
    async fn test_same_key_waits_for_release() {
        let locks = Arc::new(KeyedLocks::new());
        let guard = locks.lock("alice").await;

        let second = tokio::time::timeout(Duration::from_millis(50), locks.lock("alice")).await;
        assert!(second.is_err());

        drop(guard);
        let third = tokio::time::timeout(Duration::from_millis(100), locks.lock("alice")).await;
        assert!(third.is_ok());
    }
}
