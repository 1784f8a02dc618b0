//! Rate Limiting Module
//!
//! Sliding-window request limiter keyed by client. Used on the OTP endpoints so a
//! single client cannot hammer code issuance or guess codes quickly.

use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// Rate limit result
#[derive(Debug, Clone, PartialEq)]
pub enum RateLimitResult {
    /// Request is allowed
    Allowed {
        /// Remaining requests in the current window
        remaining: u32,
    },
    /// Request is rate limited
    Limited {
        /// Seconds until retry is allowed
        retry_after: u64,
    },
}

/// In-memory rate limiter using sliding window
#[derive(Debug, Clone)]
pub struct RateLimiter {
    /// Maximum requests per window
    limit: u32,
    /// Window length
    window: Duration,
    /// Request history (client -> timestamps, oldest first)
    request_history: Arc<RwLock<HashMap<String, VecDeque<DateTime<Utc>>>>>,
    /// Whether rate limiting is enabled
    enabled: bool,
}

impl RateLimiter {
    /// Create new rate limiter
    pub fn new(limit: u32, window: Duration, enabled: bool) -> Self {
        Self {
            limit,
            window,
            request_history: Arc::new(RwLock::new(HashMap::new())),
            enabled,
        }
    }

    /// Per-minute limiter
    pub fn per_minute(limit: u32, enabled: bool) -> Self {
        Self::new(limit, Duration::minutes(1), enabled)
    }

    /// Limiter that lets everything through
    pub fn disabled() -> Self {
        Self::new(u32::MAX, Duration::minutes(1), false)
    }

    /// Check and record a request for a client
    pub async fn check(&self, client_id: &str) -> RateLimitResult {
        self.check_at(client_id, Utc::now()).await
    }

    async fn check_at(&self, client_id: &str, now: DateTime<Utc>) -> RateLimitResult {
        if !self.enabled {
            return RateLimitResult::Allowed {
                remaining: self.limit,
            };
        }

        let cutoff = now - self.window;
        let mut history = self.request_history.write().await;
        let requests = history.entry(client_id.to_string()).or_default();

        while requests.front().is_some_and(|t| *t <= cutoff) {
            requests.pop_front();
        }

        if requests.len() >= self.limit as usize {
            let retry_after = requests
                .front()
                .map(|oldest| (*oldest + self.window - now).num_seconds().max(1) as u64)
                .unwrap_or(1);
            return RateLimitResult::Limited { retry_after };
        }

        requests.push_back(now);
        RateLimitResult::Allowed {
            remaining: self.limit - requests.len() as u32,
        }
    }

    /// Drop clients with no requests inside the window
    pub async fn prune(&self) {
        self.prune_at(Utc::now()).await;
    }

    async fn prune_at(&self, now: DateTime<Utc>) {
        let cutoff = now - self.window;
        let mut history = self.request_history.write().await;
        history.retain(|_, requests| requests.back().is_some_and(|t| *t > cutoff));
    }

    /// Number of clients currently tracked
    pub async fn tracked_clients(&self) -> usize {
        self.request_history.read().await.len()
    }

    /// Spawn a background task that prunes idle clients every `period`
    pub fn spawn_pruner(limiter: Arc<Self>, period: std::time::Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                limiter.prune().await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_limits_after_quota() {
        let limiter = RateLimiter::per_minute(2, true);
        let now = Utc::now();

        assert_eq!(
            limiter.check_at("1.2.3.4", now).await,
            RateLimitResult::Allowed { remaining: 1 }
        );
        assert_eq!(
            limiter.check_at("1.2.3.4", now).await,
            RateLimitResult::Allowed { remaining: 0 }
        );
        assert!(matches!(
            limiter.check_at("1.2.3.4", now).await,
            RateLimitResult::Limited { .. }
        ));

        // 其他客户端不受影响
        assert!(matches!(
            limiter.check_at("5.6.7.8", now).await,
            RateLimitResult::Allowed { .. }
        ));
    }

    #[tokio::test]
    async fn test_window_slides() {
        let limiter = RateLimiter::per_minute(1, true);
        let start = Utc::now();

        assert!(matches!(
            limiter.check_at("c", start).await,
            RateLimitResult::Allowed { .. }
        ));
        assert!(matches!(
            limiter.check_at("c", start + Duration::seconds(30)).await,
            RateLimitResult::Limited { retry_after: 30 }
        ));
        assert!(matches!(
            limiter.check_at("c", start + Duration::seconds(61)).await,
            RateLimitResult::Allowed { .. }
        ));
    }

    #[tokio::test]
    async fn test_prune_drops_idle_clients() {
        let limiter = RateLimiter::per_minute(5, true);
        let now = Utc::now();

        limiter.check_at("idle", now - Duration::minutes(5)).await;
        limiter.check_at("active", now).await;
        assert_eq!(limiter.tracked_clients().await, 2);

        limiter.prune_at(now).await;
        assert_eq!(limiter.tracked_clients().await, 1);
    }

    #[tokio::test]
    async fn test_pruner_runs_in_background() {
        let limiter = Arc::new(RateLimiter::new(5, Duration::milliseconds(10), true));
        limiter.check("1.2.3.4").await;
        assert_eq!(limiter.tracked_clients().await, 1);

        let handle = RateLimiter::spawn_pruner(limiter.clone(), std::time::Duration::from_millis(20));
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        handle.abort();

        assert_eq!(limiter.tracked_clients().await, 0);
    }

    #[tokio::test]
    async fn test_disabled_limiter_allows_everything() {
        let limiter = RateLimiter::disabled();
        for _ in 0..100 {
            assert!(matches!(
                limiter.check("c").await,
                RateLimitResult::Allowed { .. }
            ));
        }
        limiter.prune().await;
    }
}
