//! Crawl request/config types and the typed builder that produces them.
//!
//! Mirrors the teacher's typestate `CrawlConfigBuilder`: required fields
//! (`start_url`, `storage_dir`) must be supplied before `.build()` is
//! callable, so a misconfigured crawl fails at compile time rather than at
//! runtime.

use std::marker::PhantomData;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, anyhow};
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const MIN_DEPTH: u8 = 1;
pub const MAX_DEPTH: u8 = 10;
pub const MIN_FANOUT: usize = 1;
pub const MAX_FANOUT: usize = 50;
pub const MIN_DELAY_MS: u64 = 100;
pub const MAX_DELAY_MS: u64 = 10_000;

/// Renderer-facing options (C2): timeout, viewport, identity, network shaping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderOptions {
    pub timeout: Duration,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub user_agent: Option<String>,
    pub proxy: Option<String>,
    pub cookies: Vec<(String, String)>,
    pub extra_headers: Vec<(String, String)>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            viewport_width: 1280,
            viewport_height: 800,
            user_agent: None,
            proxy: None,
            cookies: Vec::new(),
            extra_headers: Vec::new(),
        }
    }
}

/// Tuning knobs for the readability extractor run inside the renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadabilityOptions {
    pub max_elements_to_parse: usize,
    pub n_top_candidates: usize,
    pub char_threshold: usize,
}

impl Default for ReadabilityOptions {
    fn default() -> Self {
        Self {
            max_elements_to_parse: 0, // 0 = unlimited, matches readability.js default
            n_top_candidates: 5,
            char_threshold: 500,
        }
    }
}

/// A fully validated crawl request (spec.md §3 "Crawl request").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    pub(crate) storage_dir: PathBuf,
    pub(crate) start_url: String,
    pub(crate) max_depth: u8,
    pub(crate) fanout_cap: usize,
    pub(crate) same_domain_only: bool,
    pub(crate) politeness_delay: Duration,
    pub(crate) exclude_substrings: Vec<String>,
    pub(crate) take_screenshot: bool,
    pub(crate) consult_cache: bool,
    pub(crate) render_options: RenderOptions,
    pub(crate) readability: ReadabilityOptions,

    #[serde(skip)]
    pub(crate) excluded_patterns_compiled: Vec<Regex>,
}

impl CrawlConfig {
    #[must_use]
    pub fn builder() -> CrawlConfigBuilder<()> {
        CrawlConfigBuilder::default()
    }

    #[must_use]
    pub fn storage_dir(&self) -> &PathBuf {
        &self.storage_dir
    }

    #[must_use]
    pub fn start_url(&self) -> &str {
        &self.start_url
    }

    #[must_use]
    pub fn max_depth(&self) -> u8 {
        self.max_depth
    }

    #[must_use]
    pub fn fanout_cap(&self) -> usize {
        self.fanout_cap
    }

    #[must_use]
    pub fn same_domain_only(&self) -> bool {
        self.same_domain_only
    }

    #[must_use]
    pub fn politeness_delay(&self) -> Duration {
        self.politeness_delay
    }

    #[must_use]
    pub fn exclude_substrings(&self) -> &[String] {
        &self.exclude_substrings
    }

    #[must_use]
    pub fn take_screenshot(&self) -> bool {
        self.take_screenshot
    }

    #[must_use]
    pub fn consult_cache(&self) -> bool {
        self.consult_cache
    }

    #[must_use]
    pub fn render_options(&self) -> &RenderOptions {
        &self.render_options
    }

    #[must_use]
    pub fn readability(&self) -> &ReadabilityOptions {
        &self.readability
    }
}

pub struct WithStorageDir;
pub struct WithStartUrl;

pub struct CrawlConfigBuilder<State = ()> {
    storage_dir: Option<PathBuf>,
    start_url: Option<String>,
    max_depth: u8,
    fanout_cap: usize,
    same_domain_only: bool,
    politeness_delay: Duration,
    exclude_substrings: Vec<String>,
    take_screenshot: bool,
    consult_cache: bool,
    render_options: RenderOptions,
    readability: ReadabilityOptions,
    _phantom: PhantomData<State>,
}

impl Default for CrawlConfigBuilder<()> {
    fn default() -> Self {
        Self {
            storage_dir: None,
            start_url: None,
            max_depth: 3,
            fanout_cap: 20,
            same_domain_only: true,
            politeness_delay: Duration::from_millis(500),
            exclude_substrings: Vec::new(),
            take_screenshot: false,
            consult_cache: true,
            render_options: RenderOptions::default(),
            readability: ReadabilityOptions::default(),
            _phantom: PhantomData,
        }
    }
}

impl CrawlConfigBuilder<()> {
    #[must_use]
    pub fn storage_dir(self, dir: impl Into<PathBuf>) -> CrawlConfigBuilder<WithStorageDir> {
        CrawlConfigBuilder {
            storage_dir: Some(dir.into()),
            start_url: self.start_url,
            max_depth: self.max_depth,
            fanout_cap: self.fanout_cap,
            same_domain_only: self.same_domain_only,
            politeness_delay: self.politeness_delay,
            exclude_substrings: self.exclude_substrings,
            take_screenshot: self.take_screenshot,
            consult_cache: self.consult_cache,
            render_options: self.render_options,
            readability: self.readability,
            _phantom: PhantomData,
        }
    }
}

impl CrawlConfigBuilder<WithStorageDir> {
    #[must_use]
    pub fn start_url(self, url: impl Into<String>) -> CrawlConfigBuilder<WithStartUrl> {
        CrawlConfigBuilder {
            storage_dir: self.storage_dir,
            start_url: Some(url.into()),
            max_depth: self.max_depth,
            fanout_cap: self.fanout_cap,
            same_domain_only: self.same_domain_only,
            politeness_delay: self.politeness_delay,
            exclude_substrings: self.exclude_substrings,
            take_screenshot: self.take_screenshot,
            consult_cache: self.consult_cache,
            render_options: self.render_options,
            readability: self.readability,
            _phantom: PhantomData,
        }
    }
}

// Shared, order-independent setters are available at every builder stage.
impl<State> CrawlConfigBuilder<State> {
    #[must_use]
    pub fn max_depth(mut self, depth: u8) -> Self {
        self.max_depth = depth;
        self
    }

    #[must_use]
    pub fn fanout_cap(mut self, cap: usize) -> Self {
        self.fanout_cap = cap;
        self
    }

    #[must_use]
    pub fn same_domain_only(mut self, yes: bool) -> Self {
        self.same_domain_only = yes;
        self
    }

    #[must_use]
    pub fn politeness_delay(mut self, delay: Duration) -> Self {
        self.politeness_delay = delay;
        self
    }

    #[must_use]
    pub fn exclude_substrings(mut self, patterns: Vec<String>) -> Self {
        self.exclude_substrings = patterns;
        self
    }

    #[must_use]
    pub fn take_screenshot(mut self, yes: bool) -> Self {
        self.take_screenshot = yes;
        self
    }

    #[must_use]
    pub fn consult_cache(mut self, yes: bool) -> Self {
        self.consult_cache = yes;
        self
    }

    #[must_use]
    pub fn render_options(mut self, opts: RenderOptions) -> Self {
        self.render_options = opts;
        self
    }

    #[must_use]
    pub fn readability(mut self, opts: ReadabilityOptions) -> Self {
        self.readability = opts;
        self
    }
}

impl CrawlConfigBuilder<WithStartUrl> {
    pub fn build(self) -> Result<CrawlConfig> {
        let start_url = self
            .start_url
            .ok_or_else(|| anyhow!("start_url is required"))?;
        let storage_dir = self
            .storage_dir
            .ok_or_else(|| anyhow!("storage_dir is required"))?;

        if !(MIN_DEPTH..=MAX_DEPTH).contains(&self.max_depth) {
            return Err(anyhow!(
                "max_depth {} out of range [{MIN_DEPTH}, {MAX_DEPTH}]",
                self.max_depth
            ));
        }
        if !(MIN_FANOUT..=MAX_FANOUT).contains(&self.fanout_cap) {
            return Err(anyhow!(
                "fanout_cap {} out of range [{MIN_FANOUT}, {MAX_FANOUT}]",
                self.fanout_cap
            ));
        }
        let delay_ms = u64::try_from(self.politeness_delay.as_millis()).unwrap_or(u64::MAX);
        if !(MIN_DELAY_MS..=MAX_DELAY_MS).contains(&delay_ms) {
            return Err(anyhow!(
                "politeness_delay {delay_ms}ms out of range [{MIN_DELAY_MS}, {MAX_DELAY_MS}]"
            ));
        }

        let excluded_patterns_compiled = self
            .exclude_substrings
            .iter()
            .map(|p| Regex::new(&regex::escape(p)))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| anyhow!("invalid exclude pattern: {e}"))?;

        Ok(CrawlConfig {
            storage_dir,
            start_url,
            max_depth: self.max_depth,
            fanout_cap: self.fanout_cap,
            same_domain_only: self.same_domain_only,
            politeness_delay: self.politeness_delay,
            exclude_substrings: self.exclude_substrings,
            take_screenshot: self.take_screenshot,
            consult_cache: self.consult_cache,
            render_options: self.render_options,
            readability: self.readability,
            excluded_patterns_compiled,
        })
    }
}
