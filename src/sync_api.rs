//! Synchronous scrape-now facade (C0, SPEC_FULL.md §2 supplement),
//! grounded on the teacher's `ChromiumoxideCrawler::crawl()` oneshot
//! pattern (`crawl_engine/crawler.rs`): a single direct call that drives
//! the crawler inline and returns the finished result, skipping the
//! queue/lock/worker machinery entirely.

use crate::config::CrawlConfig;
use crate::crawler::engine::run_crawl;
use crate::crawler::progress::NoOpProgress;
use crate::crawler::types::CrawlResult;
use crate::error::CrawlError;
use crate::renderer::Renderer;
use crate::store::{TieredStore, result_key};

/// Runs a crawl inline and, if `store` is given, writes the result before
/// returning it (spec.md §2: "invokes C7 inline, writing to C3 directly").
pub async fn scrape_sync(
    config: &CrawlConfig,
    renderer: &dyn Renderer,
    store: Option<&TieredStore>,
) -> Result<CrawlResult, CrawlError> {
    let result = run_crawl(config, renderer, &NoOpProgress).await?;

    if let Some(store) = store {
        let bytes = serde_json::to_vec(&result).map_err(|e| CrawlError::Encode(e.to_string()))?;
        store.store(&result_key(&result.result_id), &bytes).await?;
    }

    Ok(result)
}
