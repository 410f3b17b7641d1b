//! Two-tier result store (C3): a KV tier (`kv`) and a file tier (`file`),
//! combined under a migration phase exactly as spec.md §4.3 describes.
//! Grounded on the Python original's `redis_cache.py::RedisCache`
//! (`REDIS_MIGRATION_PHASE` env var, Redis-then-file fallback on load,
//! Redis-and-file dual-write on store) generalized to this crate's
//! `KvStore` trait so the primary tier is pluggable.

pub mod file;
pub mod kv;

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::StoreError;
use file::FileStore;
use kv::KvStore;

/// Migration phase governing which tier is primary/shadow (spec.md §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MigrationPhase {
    /// Primary = file, shadow = KV.
    P1,
    /// Primary = KV, shadow = file.
    P2,
    /// KV only.
    P3,
}

const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// The two-tier store. Key namespace is shared between crawl results
/// (`scrape_result:{fingerprint}`) and screenshots
/// (`screenshot:{fingerprint}:{index}`) — both ride the same migration
/// machinery (SPEC_FULL.md §3 screenshot storage supplement).
pub struct TieredStore {
    kv: Arc<dyn KvStore>,
    file: FileStore,
    phase: MigrationPhase,
}

impl TieredStore {
    #[must_use]
    pub fn new(kv: Arc<dyn KvStore>, file: FileStore, phase: MigrationPhase) -> Self {
        Self { kv, file, phase }
    }

    pub async fn store(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        match self.phase {
            MigrationPhase::P1 => {
                self.file.store(key, bytes).await?;
                if let Err(e) = self.kv.set(key, bytes.to_vec(), Some(DEFAULT_TTL)).await {
                    warn!(%key, error = %e, "kv tier store failed, file tier already has this key");
                }
                Ok(())
            }
            MigrationPhase::P2 => {
                let kv_result = self.kv.set(key, bytes.to_vec(), Some(DEFAULT_TTL)).await;
                if let Err(e) = self.file.store(key, bytes).await {
                    warn!(%key, error = %e, "file tier store failed");
                    if kv_result.is_err() {
                        return kv_result;
                    }
                }
                kv_result
            }
            MigrationPhase::P3 => self.kv.set(key, bytes.to_vec(), Some(DEFAULT_TTL)).await,
        }
    }

    /// KV is tried first in every phase (`redis_cache.py::load_result`:
    /// "Try Redis first (all phases)"); only P1/P2 fall back to the file
    /// tier on a KV miss, and a file-tier hit is opportunistically
    /// backfilled into KV so the next load skips the file tier entirely.
    pub async fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        if let Some(bytes) = self.load_from_kv_degrading(key).await? {
            return Ok(Some(bytes));
        }

        match self.phase {
            MigrationPhase::P1 | MigrationPhase::P2 => match self.file.load(key).await? {
                Some(bytes) => {
                    if let Err(e) = self.kv.set(key, bytes.clone(), Some(DEFAULT_TTL)).await {
                        warn!(%key, error = %e, "kv backfill on file hit failed");
                    }
                    Ok(Some(bytes))
                }
                None => Ok(None),
            },
            MigrationPhase::P3 => Ok(None),
        }
    }

    pub async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.load(key).await?.is_some())
    }

    pub async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let file_result = self.file.delete(key).await;
        let kv_result = self.kv.delete(key).await;
        file_result.and(kv_result)
    }

    pub async fn cleanup_expired(&self) -> Result<usize, StoreError> {
        self.kv.sweep_expired().await
    }

    /// KV-unavailable errors degrade to a clean `None` rather than bubbling;
    /// per spec.md §7, a dead KV tier must never fail a load that the file
    /// tier could still satisfy.
    async fn load_from_kv_degrading(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        match self.kv.get(key).await {
            Ok(v) => Ok(v),
            Err(StoreError::KvUnavailable(msg)) => {
                warn!(%key, %msg, "kv tier unavailable, degrading");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    #[must_use]
    pub fn phase(&self) -> MigrationPhase {
        self.phase
    }
}

#[must_use]
pub fn result_key(fingerprint: &str) -> String {
    format!("scrape_result:{fingerprint}")
}

#[must_use]
pub fn screenshot_key(fingerprint: &str, page_index: usize) -> String {
    format!("screenshot:{fingerprint}:{page_index}")
}
