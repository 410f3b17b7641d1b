//! Error types for the crawl engine, its cache, queue, and lock layers.

use std::fmt;

/// Error raised by the page renderer (C2).
#[derive(Debug, Clone)]
pub enum RenderError {
    /// Navigation did not complete within the configured timeout.
    Timeout(String),
    /// The renderer failed to navigate to the page at all.
    Navigation(String),
    /// The extractor script threw or returned malformed data.
    Script(String),
    /// The page loaded but produced no usable content.
    Empty(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout(url) => write!(f, "render timeout: {url}"),
            Self::Navigation(msg) => write!(f, "navigation failed: {msg}"),
            Self::Script(msg) => write!(f, "extractor script failed: {msg}"),
            Self::Empty(url) => write!(f, "empty render result: {url}"),
        }
    }
}

impl std::error::Error for RenderError {}

/// Error raised by the two-tier result store (C3).
#[derive(Debug, Clone)]
pub enum StoreError {
    /// The file tier failed (disk full, permission denied, corrupt entry).
    FileIo(String),
    /// The KV tier is unreachable; callers should degrade to file-only.
    KvUnavailable(String),
    /// The stored payload could not be (de)serialized.
    Codec(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FileIo(msg) => write!(f, "file store error: {msg}"),
            Self::KvUnavailable(msg) => write!(f, "kv store unavailable: {msg}"),
            Self::Codec(msg) => write!(f, "codec error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Error raised by the job queue (C4).
#[derive(Debug, Clone)]
pub enum QueueError {
    NotFound(String),
    Backend(String),
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "job not found: {id}"),
            Self::Backend(msg) => write!(f, "queue backend error: {msg}"),
        }
    }
}

impl std::error::Error for QueueError {}

/// Error raised by the per-URL lock (C5). Contention is not an error, it is
/// a normal `false` return from `acquire`; this enum covers backend failure.
#[derive(Debug, Clone)]
pub enum LockError {
    Backend(String),
}

impl fmt::Display for LockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backend(msg) => write!(f, "lock backend error: {msg}"),
        }
    }
}

impl std::error::Error for LockError {}

/// Error raised while driving the recursive crawler (C7).
#[derive(Debug, Clone)]
pub enum CrawlError {
    Render(RenderError),
    Store(StoreError),
    InvalidSeed(String),
    Encode(String),
}

impl fmt::Display for CrawlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Render(e) => write!(f, "{e}"),
            Self::Store(e) => write!(f, "{e}"),
            Self::InvalidSeed(url) => write!(f, "invalid seed url: {url}"),
            Self::Encode(msg) => write!(f, "result encode failed: {msg}"),
        }
    }
}

impl std::error::Error for CrawlError {}

impl From<RenderError> for CrawlError {
    fn from(e: RenderError) -> Self {
        Self::Render(e)
    }
}

impl From<StoreError> for CrawlError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

/// Umbrella error for the public API surface. Internal helpers use
/// `anyhow::Result` with `.context(..)`; this enum is what crosses the
/// boundary into caller-facing code.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    #[error("render error: {0}")]
    Render(#[from] RenderError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("queue error: {0}")]
    Queue(#[from] QueueError),
    #[error("lock error: {0}")]
    Lock(#[from] LockError),
    #[error("crawl error: {0}")]
    Crawl(#[from] CrawlError),
    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for EngineError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(format!("{err:#}"))
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
