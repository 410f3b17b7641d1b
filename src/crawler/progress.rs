//! Progress reporting abstraction for the recursive crawler, generalized
//! from `crawl_engine::progress::ProgressReporter` from a set of discrete
//! lifecycle callbacks (`report_navigation_started`, `report_page_loaded`,
//! ...) to a single `ProgressSnapshot` sink, since this crawler's caller
//! (the async worker, C8) needs to forward every update to the job queue
//! and the pub/sub bus, both of which are async operations the teacher's
//! synchronous callbacks can't carry.

use async_trait::async_trait;

use crate::queue::ProgressSnapshot;

#[async_trait]
pub trait ProgressReporter: Send + Sync {
    async fn report(&self, snapshot: ProgressSnapshot);
}

/// Reporter that does nothing, used by the synchronous single-shot path
/// (C0) which has no job to update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpProgress;

#[async_trait]
impl ProgressReporter for NoOpProgress {
    async fn report(&self, _snapshot: ProgressSnapshot) {}
}
