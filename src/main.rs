//! Worker process entry point: boots the shared queue/lock/store/bus
//! handles, launches a pool of headless-browser-backed workers, and runs
//! them until shutdown. The HTTP façade (enqueue/status/progress endpoints)
//! is out of scope (spec.md §1); this binary only drains the queue.

use std::sync::Arc;

use anyhow::Result;
use deepcrawl_engine::{
    ChromiumoxideRenderer, EngineEnv, JobQueue, ProgressBus, TieredStore, UrlLock, Worker,
};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let env = EngineEnv::load();
    std::fs::create_dir_all(&env.storage_dir)?;

    let kv = Arc::new(deepcrawl_engine::store::kv::DashMapKv::new());
    let file = deepcrawl_engine::store::file::FileStore::new(&env.storage_dir);
    let store = Arc::new(TieredStore::new(kv.clone(), file, env.migration_phase));
    let queue = Arc::new(JobQueue::new(kv.clone()));
    let lock = Arc::new(UrlLock::new(kv));
    let bus = Arc::new(ProgressBus::new());
    let renderer: Arc<dyn deepcrawl_engine::Renderer> =
        Arc::new(ChromiumoxideRenderer::launch(true).await?);

    let mut handles = Vec::with_capacity(env.worker_concurrency);
    for id in 0..env.worker_concurrency {
        let worker = Worker {
            queue: Arc::clone(&queue),
            lock: Arc::clone(&lock),
            store: Arc::clone(&store),
            bus: Arc::clone(&bus),
            renderer: Arc::clone(&renderer),
            dequeue_timeout: env.dequeue_timeout,
        };
        handles.push(tokio::spawn(async move {
            tracing::info!(worker_id = id, "worker started");
            worker.run_forever().await;
        }));
    }

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");

    for handle in handles {
        handle.abort();
    }

    Ok(())
}
