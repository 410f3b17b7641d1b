//! Integration test for S3 (spec.md §8): two jobs targeting the same seed
//! URL, the second claimant must lose the lock race and finish `skipped`
//! without ever driving a crawl.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use deepcrawl_engine::store::file::FileStore;
use deepcrawl_engine::store::kv::DashMapKv;
use deepcrawl_engine::{
    CrawlConfig, JobQueue, JobStatus, MigrationPhase, ProgressBus, RenderError, Renderer,
    RenderedPage, RenderOptions, TieredStore, UrlLock, Worker,
};

struct CountingRenderer {
    renders: Arc<AtomicUsize>,
}

#[async_trait]
impl Renderer for CountingRenderer {
    async fn render(
        &self,
        url: &str,
        _render_opts: &RenderOptions,
        _init_scripts: &[String],
        _article_script: &str,
        link_script: Option<&str>,
    ) -> Result<RenderedPage, RenderError> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        Ok(RenderedPage {
            final_url: url.to_string(),
            html: String::new(),
            article: serde_json::json!({
                "title": "t", "html": "<p>x</p>", "text": "x",
                "byline": null, "excerpt": null, "language": null, "length": 1,
            }),
            links: link_script.map(|_| serde_json::json!([])),
        })
    }
}

#[tokio::test]
async fn second_claimant_for_same_seed_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let kv = Arc::new(DashMapKv::new());
    let queue = Arc::new(JobQueue::new(kv.clone()));
    let lock = Arc::new(UrlLock::new(kv.clone()));
    let store = Arc::new(TieredStore::new(kv, FileStore::new(dir.path()), MigrationPhase::P3));
    let bus = Arc::new(ProgressBus::new());

    let config = CrawlConfig::builder()
        .storage_dir(dir.path())
        .start_url("https://example.com/shared")
        .max_depth(1)
        .build()
        .unwrap();

    // First worker claims and holds the lock for the duration of this test.
    lock.acquire("https://example.com/shared", std::time::Duration::from_secs(60))
        .await
        .unwrap();

    let renders = Arc::new(AtomicUsize::new(0));
    let worker = Worker {
        queue: queue.clone(),
        lock,
        store,
        bus,
        renderer: Arc::new(CountingRenderer { renders: renders.clone() }),
        dequeue_timeout: std::time::Duration::from_secs(5),
    };

    let job_id = queue
        .enqueue(serde_json::to_value(&config).unwrap())
        .await
        .unwrap();

    let job = queue.dequeue(std::time::Duration::from_secs(1)).await.unwrap().unwrap();
    assert_eq!(job.job_id, job_id);

    worker.process_job(&job_id, job.params).await.unwrap();

    let record = queue.get(&job_id).await.unwrap().unwrap();
    assert_eq!(record.status, JobStatus::Skipped);
    assert_eq!(renders.load(Ordering::SeqCst), 0, "a skipped job must never render");
}
