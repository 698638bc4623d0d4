//! sharesift: filesystem document crawler and text-extraction pipeline.
//!
//! Given a rooted directory (typically a mounted SMB/NFS share or a mirrored
//! site), the engine discovers every regular file, routes each through a
//! format-specific extractor, and appends one canonical record per file to a
//! CSV index. A resumable session store makes interrupted runs restartable;
//! an optional dedup store suppresses byte-identical duplicates; a separate
//! bridge builds a full-text index served by a small read-only HTTP façade.

pub mod classify;
pub mod command;
pub mod config;
pub mod crawl_engine;
pub mod extract;
pub mod mapper;
pub mod scratch;
pub mod search;
pub mod server;
pub mod session;
pub mod stats;
pub mod writer;

pub use classify::DocClass;
pub use config::{CrawlConfig, HashAlgo, Secrets, SessionBackend};
pub use crawl_engine::{
    CrawlError, CrawlResult, CrawlSummary, Crawler, DiscoveryPredicate, LogProgress, NoOpProgress,
    ProgressReporter,
};
pub use mapper::UrlMapper;
pub use scratch::{ScratchDir, ScratchManager};
pub use search::{SearchEngine, index_csv};
pub use session::{DedupStore, SessionStore};
pub use stats::{CrawlStats, StatsSnapshot};
pub use writer::{FileRecord, IndexWriter};

use tokio_util::sync::CancellationToken;

/// Run a crawl to completion with logging progress and ctrl-c handling.
pub async fn crawl(
    config: CrawlConfig,
    predicate: DiscoveryPredicate,
) -> Result<CrawlSummary, CrawlError> {
    let cancel = CancellationToken::new();

    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, shutting down");
            signal_cancel.cancel();
        }
    });

    let crawler = Crawler::new(config);
    crawler.run(predicate, LogProgress, cancel).await
}
