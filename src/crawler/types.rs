//! Shared types for the recursive crawler (C7): the queue item, the page
//! record produced by a single render, the result's per-level grouping, and
//! the flat aggregated crawl result (spec.md §3 "Crawl result").

use serde::{Deserialize, Serialize};

/// One entry of the BFS frontier: a URL discovered at `depth`, with the
/// index of the page it was discovered on (or `None` for the seed).
/// Grounded on `crawl_engine::crawl_types::CrawlQueue`, extended with
/// `parent_index` so the flat result list can reconstruct the link tree
/// without a graph structure (spec.md §9 "parent-index-by-slab").
#[derive(Debug, Clone)]
pub struct QueueItem {
    pub url: String,
    pub depth: u8,
    pub parent_index: Option<usize>,
}

/// Social preview metadata, split into its `og:*` and `twitter:*`
/// sub-maps with the prefixes stripped (spec.md §3 "social-meta dictionary
/// (og and twitter sub-maps)").
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SocialMeta {
    pub og: std::collections::HashMap<String, String>,
    pub twitter: std::collections::HashMap<String, String>,
}

/// A single rendered, extracted page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    pub url: String,
    pub title: String,
    pub readable_html: String,
    pub text: String,
    pub byline: Option<String>,
    pub excerpt: Option<String>,
    pub language: Option<String>,
    pub length: usize,
    pub social_meta: SocialMeta,
    pub parent_index: Option<usize>,
    pub level_index: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Level {
    pub level_number: u8,
    pub pages: Vec<PageRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlResult {
    pub result_id: String,
    pub seed_url: String,
    pub registered_domain: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub original_query: std::collections::HashMap<String, String>,
    pub total_pages: usize,
    pub levels: Vec<Level>,
    pub base_screenshot_key: Option<String>,
}
