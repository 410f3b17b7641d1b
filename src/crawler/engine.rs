//! Recursive BFS crawl engine (C7), grounded on
//! `crawl_engine::core::crawl_pages`'s overall loop shape (queue, visited
//! set, progress reporting, per-page extraction) and
//! `crawl_engine::link_processor`'s depth-gated link draining, narrowed
//! from the teacher's `FuturesUnordered` multi-task-per-level fan-out to a
//! single-flow, serial-within-a-level state machine (the concurrency
//! dimension moves to C8: many workers, one crawl each).

use std::collections::{HashSet, VecDeque};

use chrono::Utc;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::CrawlConfig;
use crate::error::CrawlError;
use crate::queue::ProgressSnapshot;
use crate::renderer::Renderer;
use crate::renderer::scripts::{LINK_EXTRACTOR, READABILITY_LIBRARY, readability_extractor_for};
use crate::url_fingerprint::{canonicalize, fingerprint};

use super::link_filter::should_visit_url;
use super::markdown::html_to_markdown;
use super::percent::{clamp_monotone, level_percent, page_percent};
use super::progress::ProgressReporter;
use super::social_meta::extract_social_meta;
use super::types::{CrawlResult, Level, PageRecord, QueueItem};

/// Fixed per-page cap on raw links considered before filtering (spec.md
/// §4.7 step d: "limit links per page"). Distinct from `fanout_cap`, which
/// truncates how many pages render per *level*.
const RAW_LINK_CAP: usize = 20;

/// Drives one full crawl to completion: renders the seed, follows links
/// level by level up to `config.max_depth()`, and returns the aggregated
/// result. `progress` is called after every page and at the close of every
/// level; the sync façade (C0) passes `NoOpProgress`, the worker (C8)
/// passes a reporter that forwards into the queue and pub/sub bus.
pub async fn run_crawl(
    config: &CrawlConfig,
    renderer: &dyn Renderer,
    progress: &dyn ProgressReporter,
) -> Result<CrawlResult, CrawlError> {
    let seed = Url::parse(config.start_url())
        .map_err(|_| CrawlError::InvalidSeed(config.start_url().to_string()))?;

    let registered_domain = seed.host_str().unwrap_or_default().to_string();
    let original_query: std::collections::HashMap<String, String> = seed
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut visited: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<QueueItem> = VecDeque::new();
    queue.push_back(QueueItem {
        url: config.start_url().to_string(),
        depth: 0,
        parent_index: None,
    });
    visited.insert(canonicalize(config.start_url()));

    let mut flat_pages: Vec<PageRecord> = Vec::new();
    let mut levels: Vec<Level> = Vec::new();
    let mut last_percent = 0.0f64;
    let mut base_screenshot_key: Option<String> = None;

    let init_scripts = vec![READABILITY_LIBRARY.to_string()];
    let extractor_script = readability_extractor_for(
        config.readability().max_elements_to_parse,
        config.readability().n_top_candidates,
        config.readability().char_threshold,
    );

    for current_level in 0..config.max_depth() {
        let mut this_level: Vec<QueueItem> = Vec::new();
        while let Some(item) = queue.pop_front() {
            if item.depth != current_level {
                // belongs to a later level; put it back for the next pass
                queue.push_front(item);
                break;
            }
            this_level.push(item);
        }

        if this_level.is_empty() {
            break;
        }

        // spec.md §4.7 step 3: the per-level *batch* (how many pages render
        // this level) is truncated to the fan-out cap, not the per-page raw
        // link count (that uses the fixed RAW_LINK_CAP below).
        this_level.truncate(config.fanout_cap());
        let pages_in_level = this_level.len();
        let mut level_pages: Vec<PageRecord> = Vec::with_capacity(pages_in_level);
        let mut discovered: Vec<QueueItem> = Vec::new();

        let wants_links = current_level + 1 < config.max_depth();

        for (page_index, item) in this_level.into_iter().enumerate() {
            if page_index > 0 {
                tokio::time::sleep(config.politeness_delay()).await;
            }

            let source_url = match Url::parse(&item.url) {
                Ok(u) => u,
                Err(_) => {
                    warn!(url = %item.url, "skipping unparseable queued url");
                    continue;
                }
            };

            let render_result = renderer
                .render(
                    &item.url,
                    config.render_options(),
                    &init_scripts,
                    &extractor_script,
                    wants_links.then_some(LINK_EXTRACTOR),
                )
                .await;

            let rendered = match render_result {
                Ok(r) => r,
                Err(e) => {
                    warn!(url = %item.url, error = %e, "render failed, skipping page");
                    continue;
                }
            };

            // An extractor `err` skips content aggregation only; link
            // extraction and the page's slot in the result list still
            // proceed (spec.md §4.7 step c), since both come from the same
            // render call regardless of the article's own soft failure.
            let soft_failed = rendered.article.get("err").is_some();
            if soft_failed {
                warn!(
                    url = %rendered.final_url,
                    "extractor reported soft failure, skipping content aggregation only"
                );
            }

            let (title, readable_html, text, byline, excerpt, language, length) = if soft_failed {
                (String::new(), String::new(), String::new(), None, None, None, 0usize)
            } else {
                let article_html = rendered
                    .article
                    .get("html")
                    .and_then(|v| v.as_str())
                    .unwrap_or_default();
                (
                    rendered
                        .article
                        .get("title")
                        .and_then(|v| v.as_str())
                        .unwrap_or_default()
                        .to_string(),
                    html_to_markdown(article_html),
                    rendered
                        .article
                        .get("text")
                        .and_then(|v| v.as_str())
                        .unwrap_or_default()
                        .to_string(),
                    rendered
                        .article
                        .get("byline")
                        .and_then(|v| v.as_str())
                        .map(str::to_string),
                    rendered
                        .article
                        .get("excerpt")
                        .and_then(|v| v.as_str())
                        .map(str::to_string),
                    rendered
                        .article
                        .get("language")
                        .and_then(|v| v.as_str())
                        .map(str::to_string),
                    rendered
                        .article
                        .get("length")
                        .and_then(serde_json::Value::as_u64)
                        .unwrap_or(0) as usize,
                )
            };

            let record = PageRecord {
                url: rendered.final_url.clone(),
                title,
                readable_html,
                text,
                byline,
                excerpt,
                language,
                length,
                social_meta: extract_social_meta(&rendered.html),
                parent_index: item.parent_index,
                level_index: current_level,
            };

            if current_level == 0 && config.take_screenshot() {
                base_screenshot_key = Some(fingerprint(&rendered.final_url));
            }

            let this_index = flat_pages.len() + level_pages.len();

            if let Some(links_value) = &rendered.links {
                let links = links_value.as_array().cloned().unwrap_or_default();
                for link_entry in links.into_iter().take(RAW_LINK_CAP) {
                    let Some(href) = link_entry.get("url").and_then(|v| v.as_str()) else {
                        continue;
                    };
                    if !should_visit_url(href, &source_url, &seed, config) {
                        continue;
                    }
                    let canon = canonicalize(href);
                    if visited.contains(&canon) {
                        continue;
                    }
                    visited.insert(canon);
                    discovered.push(QueueItem {
                        url: href.to_string(),
                        depth: current_level + 1,
                        parent_index: Some(this_index),
                    });
                }
            }

            let percent = clamp_monotone(
                last_percent,
                page_percent(current_level, page_index, pages_in_level, config.max_depth()),
            );
            last_percent = percent;

            progress
                .report(ProgressSnapshot {
                    current_level,
                    current_page: (page_index + 1) as u32,
                    pages_in_level: pages_in_level as u32,
                    total_levels: config.max_depth(),
                    total_pages_scraped: (flat_pages.len() + level_pages.len() + 1) as u32,
                    last_url: record.url.clone(),
                    percent,
                    status: None,
                })
                .await;

            debug!(url = %record.url, level = current_level, "page recorded");
            level_pages.push(record);
        }

        let level_percent_value = clamp_monotone(last_percent, level_percent(current_level, config.max_depth()));
        last_percent = level_percent_value;

        for item in discovered {
            queue.push_back(item);
        }

        flat_pages.extend(level_pages.iter().cloned());
        levels.push(Level {
            level_number: current_level,
            pages: level_pages,
        });

        if queue.is_empty() {
            break;
        }
    }

    info!(
        seed = %config.start_url(),
        pages = flat_pages.len(),
        "crawl complete"
    );

    let result_id = fingerprint(config.start_url());
    Ok(CrawlResult {
        result_id,
        seed_url: config.start_url().to_string(),
        registered_domain,
        timestamp: Utc::now(),
        original_query,
        total_pages: flat_pages.len(),
        levels,
        base_screenshot_key,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::progress::NoOpProgress;
    use crate::renderer::RenderedPage;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;

    struct StubRenderer {
        pages: StdMutex<std::collections::HashMap<String, serde_json::Value>>,
    }

    #[async_trait]
    impl Renderer for StubRenderer {
        async fn render(
            &self,
            url: &str,
            _render_opts: &crate::config::RenderOptions,
            _init_scripts: &[String],
            _article_script: &str,
            link_script: Option<&str>,
        ) -> Result<RenderedPage, crate::error::RenderError> {
            let pages = self.pages.lock().unwrap();
            let article = pages
                .get(url)
                .cloned()
                .unwrap_or_else(|| serde_json::json!({"err": "not found"}));
            let links = link_script.map(|_| serde_json::json!([]));
            Ok(RenderedPage {
                final_url: url.to_string(),
                html: String::new(),
                article,
                links,
            })
        }
    }

    #[tokio::test]
    async fn single_level_crawl_with_no_links_returns_one_page() {
        let mut pages = std::collections::HashMap::new();
        pages.insert(
            "https://example.com/".to_string(),
            serde_json::json!({
                "title": "Home",
                "html": "<p>hello</p>",
                "text": "hello",
                "byline": null,
                "excerpt": null,
                "language": null,
                "length": 5,
            }),
        );
        let renderer = StubRenderer {
            pages: StdMutex::new(pages),
        };
        let config = CrawlConfig::builder()
            .storage_dir("./out")
            .start_url("https://example.com/")
            .max_depth(1)
            .build()
            .unwrap();

        let result = run_crawl(&config, &renderer, &NoOpProgress).await.unwrap();
        assert_eq!(result.total_pages, 1);
        assert_eq!(result.levels.len(), 1);
        assert_eq!(result.levels[0].pages[0].title, "Home");
    }

    #[tokio::test]
    async fn rejects_invalid_seed_url() {
        let renderer = StubRenderer {
            pages: StdMutex::new(std::collections::HashMap::new()),
        };
        let config = CrawlConfig::builder()
            .storage_dir("./out")
            .start_url("not a url")
            .build()
            .unwrap();
        let err = run_crawl(&config, &renderer, &NoOpProgress).await.unwrap_err();
        assert!(matches!(err, CrawlError::InvalidSeed(_)));
    }

    #[tokio::test]
    async fn soft_extractor_failure_still_proceeds_to_link_extraction() {
        struct LinkyRenderer;

        #[async_trait]
        impl Renderer for LinkyRenderer {
            async fn render(
                &self,
                url: &str,
                _render_opts: &crate::config::RenderOptions,
                _init_scripts: &[String],
                _article_script: &str,
                link_script: Option<&str>,
            ) -> Result<RenderedPage, crate::error::RenderError> {
                if url == "https://example.com/" {
                    let links = link_script.map(|_| {
                        serde_json::json!([{"url": "https://example.com/child", "text": "child"}])
                    });
                    return Ok(RenderedPage {
                        final_url: url.to_string(),
                        html: String::new(),
                        article: serde_json::json!({"err": "readability produced no content"}),
                        links,
                    });
                }
                Ok(RenderedPage {
                    final_url: url.to_string(),
                    html: String::new(),
                    article: serde_json::json!({
                        "title": "Child", "html": "<p>c</p>", "text": "c",
                        "byline": null, "excerpt": null, "language": null, "length": 1,
                    }),
                    links: link_script.map(|_| serde_json::json!([])),
                })
            }
        }

        let config = CrawlConfig::builder()
            .storage_dir("./out")
            .start_url("https://example.com/")
            .max_depth(2)
            .build()
            .unwrap();

        let result = run_crawl(&config, &LinkyRenderer, &NoOpProgress).await.unwrap();
        assert_eq!(result.total_pages, 2);
        assert_eq!(result.levels[0].pages[0].title, "");
        assert_eq!(result.levels[1].pages[0].title, "Child");
    }

    #[tokio::test]
    async fn fanout_cap_truncates_pages_rendered_per_level() {
        struct ManyLinksRenderer;

        #[async_trait]
        impl Renderer for ManyLinksRenderer {
            async fn render(
                &self,
                url: &str,
                _render_opts: &crate::config::RenderOptions,
                _init_scripts: &[String],
                _article_script: &str,
                link_script: Option<&str>,
            ) -> Result<RenderedPage, crate::error::RenderError> {
                let links = link_script.map(|_| {
                    serde_json::json!([
                        {"url": "https://example.com/a", "text": "a"},
                        {"url": "https://example.com/b", "text": "b"},
                        {"url": "https://example.com/c", "text": "c"},
                    ])
                });
                Ok(RenderedPage {
                    final_url: url.to_string(),
                    html: String::new(),
                    article: serde_json::json!({
                        "title": "t", "html": "<p>x</p>", "text": "x",
                        "byline": null, "excerpt": null, "language": null, "length": 1,
                    }),
                    links,
                })
            }
        }

        let config = CrawlConfig::builder()
            .storage_dir("./out")
            .start_url("https://example.com/")
            .max_depth(2)
            .fanout_cap(2)
            .build()
            .unwrap();

        let result = run_crawl(&config, &ManyLinksRenderer, &NoOpProgress).await.unwrap();
        assert_eq!(result.levels[0].pages.len(), 1);
        assert_eq!(result.levels[1].pages.len(), 2);
    }
}
