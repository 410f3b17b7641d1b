//! Typed environment knob loader (SPEC_FULL.md §6 ambient), grounded on
//! the teacher's `CrawlConfig` builder pattern: every knob has a documented
//! default matching spec.md §6, read once at startup and logged via
//! `tracing` rather than read ad hoc at call sites.

use std::time::Duration;

use tracing::info;

const DEFAULT_STORAGE_DIR: &str = "./storage";
const DEFAULT_WORKER_CONCURRENCY: usize = 4;
const DEFAULT_DEQUEUE_TIMEOUT_SECS: u64 = 5;
const DEFAULT_MIGRATION_PHASE: &str = "P3";

#[derive(Debug, Clone)]
pub struct EngineEnv {
    pub storage_dir: String,
    pub worker_concurrency: usize,
    pub dequeue_timeout: Duration,
    pub migration_phase: crate::store::MigrationPhase,
}

impl EngineEnv {
    /// Reads every knob from the environment, falling back to the spec's
    /// inline defaults when unset or unparseable.
    #[must_use]
    pub fn load() -> Self {
        let storage_dir =
            std::env::var("DEEPCRAWL_STORAGE_DIR").unwrap_or_else(|_| DEFAULT_STORAGE_DIR.to_string());

        let worker_concurrency = std::env::var("DEEPCRAWL_WORKER_CONCURRENCY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_WORKER_CONCURRENCY);

        let dequeue_timeout = std::env::var("DEEPCRAWL_DEQUEUE_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(DEFAULT_DEQUEUE_TIMEOUT_SECS));

        let migration_phase = match std::env::var("REDIS_MIGRATION_PHASE")
            .unwrap_or_else(|_| DEFAULT_MIGRATION_PHASE.to_string())
            .as_str()
        {
            "P1" => crate::store::MigrationPhase::P1,
            "P2" => crate::store::MigrationPhase::P2,
            _ => crate::store::MigrationPhase::P3,
        };

        let env = Self {
            storage_dir,
            worker_concurrency,
            dequeue_timeout,
            migration_phase,
        };

        info!(
            storage_dir = %env.storage_dir,
            worker_concurrency = env.worker_concurrency,
            migration_phase = ?env.migration_phase,
            "engine environment loaded"
        );

        env
    }
}
