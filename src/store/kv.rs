//! The in-process KV tier used as the primary tier of the two-tier store.
//!
//! `KvStore` is a trait, not a concrete backend, so a real networked
//! implementation (the thing the "distributed" in this system's name points
//! at) is a drop-in replacement with no call-site changes. `DashMapKv` is
//! the only implementation this crate ships, grounded on the teacher's
//! `DashMap<String, _>` pattern used throughout `crawl_engine` for
//! concurrent per-key state (`domain_limiter::DomainLimiter`,
//! `crawl_engine/circuit_breaker.rs`).

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::StoreError;

#[derive(Clone)]
struct Entry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

#[async_trait]
pub trait KvStore: Send + Sync {
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<(), StoreError>;
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
    async fn exists(&self, key: &str) -> Result<bool, StoreError>;
    /// Atomic set-if-absent with TTL, used by the per-URL lock (C5).
    async fn set_if_absent(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<bool, StoreError>;
    /// Removes every entry whose TTL has elapsed; returns the count removed.
    async fn sweep_expired(&self) -> Result<usize, StoreError>;
}

#[derive(Default)]
pub struct DashMapKv {
    map: DashMap<String, Entry>,
}

impl DashMapKv {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn is_live(entry: &Entry) -> bool {
        match entry.expires_at {
            Some(at) => Instant::now() < at,
            None => true,
        }
    }
}

#[async_trait]
impl KvStore for DashMapKv {
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<(), StoreError> {
        let expires_at = ttl.map(|d| Instant::now() + d);
        self.map.insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        match self.map.get(key) {
            Some(entry) if Self::is_live(&entry) => Ok(Some(entry.value.clone())),
            Some(_) => {
                self.map.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.map.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.get(key).await?.is_some())
    }

    async fn set_if_absent(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<bool, StoreError> {
        let expires_at = Some(Instant::now() + ttl);
        let mut acquired = false;
        self.map
            .entry(key.to_string())
            .and_modify(|existing| {
                if !Self::is_live(existing) {
                    *existing = Entry {
                        value: value.clone(),
                        expires_at,
                    };
                    acquired = true;
                }
            })
            .or_insert_with(|| {
                acquired = true;
                Entry { value, expires_at }
            });
        Ok(acquired)
    }

    async fn sweep_expired(&self) -> Result<usize, StoreError> {
        let before = self.map.len();
        self.map.retain(|_, entry| Self::is_live(entry));
        Ok(before - self.map.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_get_roundtrip() {
        let kv = DashMapKv::new();
        kv.set("a", b"hello".to_vec(), None).await.unwrap();
        assert_eq!(kv.get("a").await.unwrap(), Some(b"hello".to_vec()));
    }

    #[tokio::test]
    async fn set_if_absent_is_exclusive() {
        let kv = DashMapKv::new();
        assert!(
            kv.set_if_absent("lock:x", b"1".to_vec(), Duration::from_secs(60))
                .await
                .unwrap()
        );
        assert!(
            !kv.set_if_absent("lock:x", b"1".to_vec(), Duration::from_secs(60))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn expired_entry_is_absent() {
        let kv = DashMapKv::new();
        kv.set("a", b"1".to_vec(), Some(Duration::from_millis(1)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(kv.get("a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn set_if_absent_reclaims_after_expiry() {
        let kv = DashMapKv::new();
        assert!(
            kv.set_if_absent("lock:x", b"1".to_vec(), Duration::from_millis(1))
                .await
                .unwrap()
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(
            kv.set_if_absent("lock:x", b"1".to_vec(), Duration::from_secs(60))
                .await
                .unwrap()
        );
    }
}
