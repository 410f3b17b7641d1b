//! Async worker loop (C8), grounded on `mcp::session::CrawlSession::execute_crawl_with_timeout`
//! (claim/state-transition/progress-tracker-task shape) generalized from a
//! single in-process session object to a durable multi-worker loop, and on
//! `other_examples`'s `riptide-workers/src/processors.rs::JobProcessor::process_job`
//! dispatch-and-record pattern for the enqueue/claim/finalize skeleton,
//! since the teacher itself has no durable cross-process queue.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::config::CrawlConfig;
use crate::crawler::engine::run_crawl;
use crate::crawler::progress::ProgressReporter;
use crate::error::EngineError;
use crate::lock::{DEFAULT_LOCK_TTL, UrlLock};
use crate::pubsub::ProgressBus;
use crate::queue::{JobQueue, JobStatus, ProgressSnapshot};
use crate::renderer::Renderer;
use crate::store::{TieredStore, result_key};

/// Fallback used only by call sites that don't thread a configured value
/// through (e.g. [`EngineEnv::dequeue_timeout`](crate::env::EngineEnv)).
pub const DEFAULT_DEQUEUE_TIMEOUT: Duration = Duration::from_secs(5);

/// Forwards every progress update into the job's queue record and the
/// pub/sub bus, the two side effects the worker needs on each page.
struct QueueProgressReporter {
    queue: Arc<JobQueue>,
    bus: Arc<ProgressBus>,
    job_id: String,
}

#[async_trait]
impl ProgressReporter for QueueProgressReporter {
    async fn report(&self, snapshot: ProgressSnapshot) {
        if let Err(e) = self.bus.publish(&self.queue, &self.job_id, snapshot).await {
            warn!(job_id = %self.job_id, error = %e, "failed to publish progress");
        }
    }
}

/// One worker's dequeue/claim/drive/finalize loop. Multiple workers share
/// the same `queue`/`lock`/`store`/`bus` handles (spec.md §5: parallel
/// multi-process workers over a shared FIFO).
pub struct Worker {
    pub queue: Arc<JobQueue>,
    pub lock: Arc<UrlLock>,
    pub store: Arc<TieredStore>,
    pub bus: Arc<ProgressBus>,
    pub renderer: Arc<dyn Renderer>,
    pub dequeue_timeout: Duration,
}

impl Worker {
    /// Runs until `queue.dequeue` is cancelled externally (e.g. the caller
    /// drops the future on shutdown). Each iteration handles exactly one
    /// job; a lock-contended job is marked `skipped` rather than retried,
    /// matching spec.md §4.5 ("no retry/queueing").
    pub async fn run_forever(&self) {
        loop {
            match self.queue.dequeue(self.dequeue_timeout).await {
                Ok(Some(job)) => {
                    if let Err(e) = self.process_job(&job.job_id, job.params).await {
                        error!(job_id = %job.job_id, error = %e, "job processing failed");
                    }
                }
                Ok(None) => continue,
                Err(e) => {
                    error!(error = %e, "dequeue failed");
                }
            }
        }
    }

    /// Processes exactly one already-dequeued job end to end: claim the
    /// seed's lock, drive the crawl, store the result, finalize status.
    /// Public so callers that want single-job control (tests, a
    /// bounded-concurrency runner) can bypass `run_forever`'s own loop.
    pub async fn process_job(&self, job_id: &str, params: serde_json::Value) -> Result<(), EngineError> {
        let config: CrawlConfig = serde_json::from_value(params)
            .map_err(|e| EngineError::Other(format!("invalid job params: {e}")))?;

        let seed_url = config.start_url().to_string();

        let acquired = self.lock.acquire(&seed_url, DEFAULT_LOCK_TTL).await?;
        if !acquired {
            info!(job_id, url = %seed_url, "lock contended, marking job skipped");
            self.queue
                .set_status(job_id, JobStatus::Skipped, None, None)
                .await?;
            return Ok(());
        }

        self.queue
            .set_status(job_id, JobStatus::Running, None, None)
            .await?;

        let reporter = QueueProgressReporter {
            queue: Arc::clone(&self.queue),
            bus: Arc::clone(&self.bus),
            job_id: job_id.to_string(),
        };

        let outcome = run_crawl(&config, self.renderer.as_ref(), &reporter).await;

        let result = match outcome {
            Ok(crawl_result) => {
                let bytes = serde_json::to_vec(&crawl_result)
                    .map_err(|e| EngineError::Other(format!("result encode failed: {e}")))?;
                self.store.store(&result_key(&crawl_result.result_id), &bytes).await?;
                let status_result = self
                    .queue
                    .set_status(job_id, JobStatus::Done, Some(crawl_result.result_id), None)
                    .await;
                reporter
                    .report(ProgressSnapshot {
                        current_level: config.max_depth(),
                        current_page: 0,
                        pages_in_level: 0,
                        total_levels: config.max_depth(),
                        total_pages_scraped: crawl_result.total_pages as u32,
                        last_url: seed_url.clone(),
                        percent: 100.0,
                        status: Some(JobStatus::Done),
                    })
                    .await;
                status_result
            }
            Err(e) => {
                warn!(job_id, error = %e, "crawl failed");
                let status_result = self
                    .queue
                    .set_status(job_id, JobStatus::Error, None, Some(e.to_string()))
                    .await;
                reporter
                    .report(ProgressSnapshot {
                        current_level: 0,
                        current_page: 0,
                        pages_in_level: 0,
                        total_levels: 0,
                        total_pages_scraped: 0,
                        last_url: seed_url.clone(),
                        percent: 100.0,
                        status: Some(JobStatus::Error),
                    })
                    .await;
                status_result
            }
        };

        self.lock.release(&seed_url).await?;
        result.map_err(EngineError::from)
    }
}
