pub mod config;
pub mod crawler;
pub mod env;
pub mod error;
pub mod lock;
pub mod presentation;
pub mod pubsub;
pub mod queue;
pub mod renderer;
pub mod store;
pub mod sync_api;
pub mod url_fingerprint;
pub mod worker;

pub use config::{CrawlConfig, CrawlConfigBuilder, ReadabilityOptions, RenderOptions};
pub use crawler::{CrawlResult, Level, PageRecord, QueueItem, SocialMeta, run_crawl};
pub use env::EngineEnv;
pub use error::{CrawlError, EngineError, EngineResult, LockError, QueueError, RenderError, StoreError};
pub use lock::UrlLock;
pub use pubsub::{ProgressBus, ProgressEvent};
pub use queue::{EnqueueOutcome, JobQueue, JobRecord, JobStatus, ProgressSnapshot};
pub use renderer::{ChromiumoxideRenderer, Renderer, RenderedPage};
pub use store::{MigrationPhase, TieredStore};
pub use sync_api::scrape_sync;
pub use url_fingerprint::{canonicalize, fingerprint};
pub use worker::Worker;
