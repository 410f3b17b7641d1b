//! Headless browser rendering interface (C2).
//!
//! `Renderer` is the seam between the crawl engine and a real browser
//! automation backend. The engine only ever sees this trait; the concrete
//! `ChromiumoxideRenderer` wraps `chromiumoxide` the way the teacher's
//! `browser_setup::launch_browser` + `browser_pool::PooledBrowserWrapper` do
//! (RAII guard around an `Arc<Browser>`, CDP handler task aborted on drop).

pub mod scripts;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfig};
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::RenderOptions;
use crate::error::RenderError;

/// Outcome of rendering one page: the URL the browser actually ended up at
/// (redirect-following), the raw HTML (fed to the server-side social-meta
/// parser and stored for debugging), the article extractor's JSON record
/// (may itself carry an `err` field on soft failure), and the link
/// extractor's JSON array, present only when the caller asked for it.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub final_url: String,
    pub html: String,
    pub article: Value,
    pub links: Option<Value>,
}

#[async_trait]
pub trait Renderer: Send + Sync {
    /// Navigates to `url` exactly once, running `init_scripts` before
    /// navigation and `article_script` after load; `link_script`, when
    /// given, is evaluated on the same already-loaded page (no second
    /// navigation) and its result returned as `RenderedPage::links`.
    async fn render(
        &self,
        url: &str,
        render_opts: &RenderOptions,
        init_scripts: &[String],
        article_script: &str,
        link_script: Option<&str>,
    ) -> Result<RenderedPage, RenderError>;
}

/// RAII wrapper around a launched browser, grounded on
/// `browser_pool::PooledBrowserWrapper`: the CDP event loop handler is
/// aborted when the wrapper is dropped so no task outlives the browser.
struct BrowserHandle {
    browser: Arc<Browser>,
    handler: JoinHandle<()>,
}

impl Drop for BrowserHandle {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

/// `Renderer` backed by a real headless Chrome instance via `chromiumoxide`.
pub struct ChromiumoxideRenderer {
    handle: BrowserHandle,
}

impl ChromiumoxideRenderer {
    pub async fn launch(headless: bool) -> Result<Self> {
        let mut builder = BrowserConfig::builder().request_timeout(Duration::from_secs(30));
        if !headless {
            builder = builder.with_head();
        }
        let config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("invalid browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch chromium")?;

        let join = tokio::spawn(async move {
            use futures::StreamExt;
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    warn!("chromium CDP handler error: {e}");
                }
            }
        });

        info!("chromium launched");
        Ok(Self {
            handle: BrowserHandle {
                browser: Arc::new(browser),
                handler: join,
            },
        })
    }

    /// Opens a blank page and applies identity/viewport settings. Does
    /// *not* navigate: navigation happens in `render` only after
    /// `init_scripts` have been registered via `evaluate_on_new_document`,
    /// so they take effect on the very first navigation rather than the
    /// next one.
    async fn new_page(&self, opts: &RenderOptions) -> Result<Page, RenderError> {
        let page = self
            .handle
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| RenderError::Navigation(e.to_string()))?;

        if let Some(ua) = &opts.user_agent {
            let _ = page.set_user_agent(ua).await;
        }

        let _ = page
            .set_viewport(chromiumoxide::page::Viewport {
                width: opts.viewport_width,
                height: opts.viewport_height,
                ..Default::default()
            })
            .await;

        Ok(page)
    }
}

#[async_trait]
impl Renderer for ChromiumoxideRenderer {
    async fn render(
        &self,
        url: &str,
        render_opts: &RenderOptions,
        init_scripts: &[String],
        article_script: &str,
        link_script: Option<&str>,
    ) -> Result<RenderedPage, RenderError> {
        let page = self.new_page(render_opts).await?;

        for script in init_scripts {
            page.evaluate_on_new_document(script.as_str())
                .await
                .map_err(|e| RenderError::Script(e.to_string()))?;
        }

        tokio::time::timeout(render_opts.timeout, page.goto(url))
            .await
            .map_err(|_| RenderError::Timeout(url.to_string()))?
            .map_err(|e| RenderError::Navigation(e.to_string()))?;

        tokio::time::timeout(render_opts.timeout, page.wait_for_navigation())
            .await
            .map_err(|_| RenderError::Timeout(url.to_string()))?
            .map_err(|e| RenderError::Navigation(e.to_string()))?;

        let final_url = page.url().await.ok().flatten().unwrap_or_else(|| url.to_string());

        let html = page
            .content()
            .await
            .map_err(|e| RenderError::Navigation(e.to_string()))?;

        if html.trim().is_empty() {
            return Err(RenderError::Empty(final_url));
        }

        let article: Value = page
            .evaluate(article_script)
            .await
            .map_err(|e| RenderError::Script(e.to_string()))?
            .into_value()
            .map_err(|e| RenderError::Script(e.to_string()))?;

        let links = match link_script {
            Some(script) => {
                let value: Value = page
                    .evaluate(script)
                    .await
                    .map_err(|e| RenderError::Script(e.to_string()))?
                    .into_value()
                    .map_err(|e| RenderError::Script(e.to_string()))?;
                Some(value)
            }
            None => None,
        };

        debug!(url = %final_url, "rendered page");

        Ok(RenderedPage {
            final_url,
            html,
            article,
            links,
        })
    }
}
