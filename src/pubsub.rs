//! Progress pub/sub (C6), grounded on `crawl_events::bus::core::CrawlEventBus`:
//! a `tokio::sync::broadcast` channel generalized from crawl-lifecycle
//! events to per-job progress snapshots. Subscribers read the latest
//! snapshot from the KV tier first (so a subscriber that connects after the
//! job is already halfway done doesn't miss its current state), then attach
//! to the broadcast topic for subsequent updates.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::warn;

use crate::error::QueueError;
use crate::queue::{JobQueue, ProgressSnapshot};

const DEFAULT_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub job_id: String,
    pub snapshot: ProgressSnapshot,
}

pub struct ProgressBus {
    sender: broadcast::Sender<ProgressEvent>,
}

impl ProgressBus {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes a progress update: writes the snapshot to the queue's
    /// per-job state and fans it out to subscribers. If nobody is
    /// listening, `send` returning an error is expected and silent.
    pub async fn publish(
        &self,
        queue: &JobQueue,
        job_id: &str,
        snapshot: ProgressSnapshot,
    ) -> Result<(), QueueError> {
        queue.set_progress(job_id, snapshot.clone()).await?;
        if self
            .sender
            .send(ProgressEvent {
                job_id: job_id.to_string(),
                snapshot,
            })
            .is_err()
        {
            warn!(job_id, "no subscribers on progress bus");
        }
        Ok(())
    }

    /// Returns the latest snapshot (if any) followed by a filtered
    /// subscription to further updates for `job_id`.
    pub async fn subscribe(
        &self,
        queue: &Arc<JobQueue>,
        job_id: &str,
    ) -> Result<(Option<ProgressSnapshot>, broadcast::Receiver<ProgressEvent>), QueueError> {
        let snapshot = queue.get_progress(job_id).await?;
        Ok((snapshot, self.sender.subscribe()))
    }
}

impl Default for ProgressBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Filters a raw receiver down to events for one job. Intended to be driven
/// in a loop by the caller (e.g. an SSE/websocket handler in the out-of-scope
/// HTTP façade).
pub async fn next_for_job(
    rx: &mut broadcast::Receiver<ProgressEvent>,
    job_id: &str,
) -> Option<ProgressEvent> {
    loop {
        match rx.recv().await {
            Ok(event) if event.job_id == job_id => return Some(event),
            Ok(_) => continue,
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => return None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::kv::DashMapKv;

    fn sample_snapshot(percent: f64) -> ProgressSnapshot {
        ProgressSnapshot {
            current_level: 0,
            current_page: 1,
            pages_in_level: 1,
            total_levels: 1,
            total_pages_scraped: 1,
            last_url: "https://example.com".to_string(),
            percent,
            status: None,
        }
    }

    #[tokio::test]
    async fn subscribe_returns_latest_snapshot_then_live_updates() {
        let queue = Arc::new(JobQueue::new(Arc::new(DashMapKv::new())));
        let job_id = queue.enqueue(serde_json::json!({})).await.unwrap();
        let bus = ProgressBus::new();

        bus.publish(&queue, &job_id, sample_snapshot(10.0)).await.unwrap();
        let (snapshot, mut rx) = bus.subscribe(&queue, &job_id).await.unwrap();
        assert_eq!(snapshot.unwrap().percent, 10.0);

        bus.publish(&queue, &job_id, sample_snapshot(50.0)).await.unwrap();
        let event = next_for_job(&mut rx, &job_id).await.unwrap();
        assert_eq!(event.snapshot.percent, 50.0);
    }
}
