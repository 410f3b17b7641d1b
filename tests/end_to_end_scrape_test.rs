//! End-to-end test of the synchronous facade (C0) through to the
//! presentation projections, using a stub renderer with two linked pages
//! so the crawl actually fans out a level (spec.md §8 S1/S6-adjacent).

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;

use async_trait::async_trait;
use deepcrawl_engine::store::file::FileStore;
use deepcrawl_engine::store::kv::DashMapKv;
use deepcrawl_engine::{
    scrape_sync, CrawlConfig, MigrationPhase, RenderError, Renderer, RenderedPage, RenderOptions,
    TieredStore,
};

struct LinkedPagesRenderer {
    pages: StdMutex<HashMap<String, serde_json::Value>>,
}

#[async_trait]
impl Renderer for LinkedPagesRenderer {
    async fn render(
        &self,
        url: &str,
        _render_opts: &RenderOptions,
        _init_scripts: &[String],
        _article_script: &str,
        link_script: Option<&str>,
    ) -> Result<RenderedPage, RenderError> {
        let pages = self.pages.lock().unwrap();
        let article = pages
            .get(url)
            .cloned()
            .unwrap_or_else(|| serde_json::json!({"err": "missing fixture"}));
        let links = link_script.map(|_| {
            if url == "https://example.com/" {
                serde_json::json!([{"url": "https://example.com/child", "text": "child"}])
            } else {
                serde_json::json!([])
            }
        });
        Ok(RenderedPage {
            final_url: url.to_string(),
            html: String::new(),
            article,
            links,
        })
    }
}

#[tokio::test]
async fn two_level_crawl_produces_both_pages_and_renders_markdown() {
    let mut pages = HashMap::new();
    pages.insert(
        "https://example.com/".to_string(),
        serde_json::json!({
            "title": "Home", "html": "<h1>Home</h1><p>Welcome.</p>", "text": "Welcome.",
            "byline": null, "excerpt": null, "language": null, "length": 8,
        }),
    );
    pages.insert(
        "https://example.com/child".to_string(),
        serde_json::json!({
            "title": "Child", "html": "<p>Child page.</p>", "text": "Child page.",
            "byline": null, "excerpt": null, "language": null, "length": 11,
        }),
    );
    let renderer = LinkedPagesRenderer { pages: StdMutex::new(pages) };

    let dir = tempfile::tempdir().unwrap();
    let kv = Arc::new(DashMapKv::new());
    let store = TieredStore::new(kv, FileStore::new(dir.path()), MigrationPhase::P3);

    let config = CrawlConfig::builder()
        .storage_dir(dir.path())
        .start_url("https://example.com/")
        .max_depth(2)
        .build()
        .unwrap();

    let result = scrape_sync(&config, &renderer, Some(&store)).await.unwrap();

    assert_eq!(result.total_pages, 2);
    assert_eq!(result.levels.len(), 2);
    assert_eq!(result.levels[1].pages[0].parent_index, Some(0));

    let markdown = deepcrawl_engine::presentation::to_markdown(&result);
    assert!(markdown.contains("Welcome."));
    assert!(markdown.contains("Child page."));

    let json = deepcrawl_engine::presentation::to_json(&result);
    assert_eq!(json["total_pages"], 2);
}
