//! Per-URL distributed mutex (C5).
//!
//! Same shape as `crawl_engine::domain_limiter::DomainLimiter` (a
//! `DashMap`-backed per-key primitive) but swapped from a concurrency
//! *semaphore* to a mutual-exclusion *lock with expiry*, matching the
//! Python original's `redis_queue.acquire_lock`/`release_lock`
//! (`SETNX` + `EXPIRE`, key = `lock:` + normalized URL).

use std::sync::Arc;
use std::time::Duration;

use crate::error::LockError;
use crate::store::kv::KvStore;
use crate::url_fingerprint::canonicalize;

pub const LOCK_PREFIX: &str = "lock:";
pub const DEFAULT_LOCK_TTL: Duration = Duration::from_secs(600);

pub struct UrlLock {
    kv: Arc<dyn KvStore>,
}

impl UrlLock {
    #[must_use]
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    fn key_for(url: &str) -> String {
        format!("{LOCK_PREFIX}{}", canonicalize(url))
    }

    /// Attempts to claim the lock for `url`. No retry, no queueing: a
    /// caller that loses the race gets `Ok(false)` immediately and the
    /// worker marks the job `skipped` (spec.md §4.5).
    pub async fn acquire(&self, url: &str, ttl: Duration) -> Result<bool, LockError> {
        self.kv
            .set_if_absent(&Self::key_for(url), b"1".to_vec(), ttl)
            .await
            .map_err(|e| LockError::Backend(e.to_string()))
    }

    pub async fn release(&self, url: &str) -> Result<(), LockError> {
        self.kv
            .delete(&Self::key_for(url))
            .await
            .map_err(|e| LockError::Backend(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::kv::DashMapKv;

    #[tokio::test]
    async fn second_acquire_fails_while_held() {
        let lock = UrlLock::new(Arc::new(DashMapKv::new()));
        assert!(lock.acquire("https://example.com/a", DEFAULT_LOCK_TTL).await.unwrap());
        assert!(!lock.acquire("https://example.com/a", DEFAULT_LOCK_TTL).await.unwrap());
    }

    #[tokio::test]
    async fn release_then_acquire_succeeds() {
        let lock = UrlLock::new(Arc::new(DashMapKv::new()));
        lock.acquire("https://example.com/a", DEFAULT_LOCK_TTL).await.unwrap();
        lock.release("https://example.com/a").await.unwrap();
        assert!(lock.acquire("https://example.com/a", DEFAULT_LOCK_TTL).await.unwrap());
    }

    #[tokio::test]
    async fn lock_key_is_canonicalized() {
        let lock = UrlLock::new(Arc::new(DashMapKv::new()));
        assert!(
            lock.acquire("https://EXAMPLE.com/a/", DEFAULT_LOCK_TTL)
                .await
                .unwrap()
        );
        assert!(
            !lock
                .acquire("https://example.com/a#frag", DEFAULT_LOCK_TTL)
                .await
                .unwrap()
        );
    }
}
