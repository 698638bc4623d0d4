//! Core types for crawl operations.

use std::path::PathBuf;

use thiserror::Error;

use crate::session::StoreError;
use crate::stats::StatsSnapshot;

/// Errors that abort a run. Per-file failures never appear here; they are
/// visible only through counters and the log.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("discovery failed: {0}")]
    Discovery(String),

    #[error("index writer error: {0}")]
    Writer(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("crawl cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for CrawlError {
    fn from(err: anyhow::Error) -> Self {
        // {:#} preserves the full context chain.
        Self::Other(format!("{err:#}"))
    }
}

/// Convenience alias for Result with `CrawlError`.
pub type CrawlResult<T> = Result<T, CrawlError>;

/// Final accounting for a completed (or cancelled) run.
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    pub stats: StatsSnapshot,
    pub output_csv: PathBuf,
    pub cancelled: bool,
}

/// One file moving through the per-file pipeline.
///
/// Depth and parent linkage are explicit values handed down the recursion,
/// never ambient state.
#[derive(Debug, Clone)]
pub struct FileTask {
    /// The file actually opened and read. For nested files this is the
    /// unpacked copy inside scratch.
    pub path: PathBuf,
    /// The on-disk location recorded in the emitted record: the file itself
    /// at depth zero, the containing document for nested files.
    pub physical_path: PathBuf,
    /// Logical URL, `#name`-suffixed along the nesting chain.
    pub url: String,
    /// Nesting depth; zero for files found by discovery.
    pub depth: usize,
}
