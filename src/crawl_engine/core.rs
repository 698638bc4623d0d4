//! Crawl orchestration: discovery stream, worker pool, shutdown.
//!
//! Workers are tokio tasks bounded by a semaphore; each takes one discovered
//! file at a time and runs its full pipeline synchronously, nested recursion
//! included. Cancellation stops consumption of the discovery stream, lets
//! the pipelines' command runner kill in-flight extractors, flushes the
//! index writer and sweeps every registered scratch directory.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::discovery::{self, DiscoveryPredicate};
use super::pipeline::FilePipeline;
use super::progress::ProgressReporter;
use super::types::{CrawlError, CrawlResult, CrawlSummary};
use crate::config::CrawlConfig;
use crate::mapper::UrlMapper;
use crate::scratch::ScratchManager;
use crate::session::{DedupStore, SessionStore};
use crate::stats::CrawlStats;
use crate::writer::IndexWriter;

/// Seconds between periodic progress summaries.
const PROGRESS_INTERVAL_SECS: u64 = 30;

/// The crawl engine. Owns nothing but configuration; stores, writer and
/// scratch manager are opened per run and threaded through as explicit
/// dependencies.
pub struct Crawler {
    config: CrawlConfig,
}

impl Crawler {
    #[must_use]
    pub fn new(config: CrawlConfig) -> Self {
        Self { config }
    }

    /// Run discovery and the worker pool to completion.
    ///
    /// Per-file errors never surface here; the only error returns are
    /// startup failures and index writer append failures.
    pub async fn run<P: ProgressReporter>(
        &self,
        predicate: DiscoveryPredicate,
        progress: P,
        cancel: CancellationToken,
    ) -> CrawlResult<CrawlSummary> {
        self.config
            .validate()
            .map_err(|e| CrawlError::Config(format!("{e:#}")))?;

        let config = Arc::new(self.config.clone());
        let stats = Arc::new(CrawlStats::new());
        let mapper = UrlMapper::from_root(config.root());

        let session = Arc::new(
            SessionStore::open(config.session_backend(), &config.session_db_path())
                .await
                .map_err(|e| CrawlError::Config(format!("session store: {e:#}")))?,
        );
        let dedup = if config.dedupe_enabled() {
            Some(Arc::new(
                DedupStore::open(config.session_backend(), &config.dedupe_db_path())
                    .await
                    .map_err(|e| CrawlError::Config(format!("dedup store: {e:#}")))?,
            ))
        } else {
            None
        };

        let output_csv = config.output_csv_path();
        let writer = Arc::new(
            IndexWriter::create(&output_csv, config.csv_buffer_bytes(), config.lock_output())
                .map_err(|e| CrawlError::Config(format!("index writer: {e:#}")))?,
        );
        let scratch = ScratchManager::new(config.temp_dir().join("sharesift"))
            .map_err(|e| CrawlError::Config(format!("scratch manager: {e:#}")))?;

        progress.report_discovery_started(config.root());

        let total = discovery::estimate_total(config.root().to_path_buf(), predicate.clone())
            .await
            .map_err(|e| CrawlError::Discovery(format!("{e:#}")))?;
        stats.add_total(total);
        progress.report_total_estimated(total);

        let pipeline = FilePipeline {
            config: Arc::clone(&config),
            session: Arc::clone(&session),
            dedup,
            writer: Arc::clone(&writer),
            scratch: scratch.clone(),
            stats: Arc::clone(&stats),
            mapper,
            cancel: cancel.clone(),
        };

        let mut rx = discovery::spawn_discovery(
            config.root().to_path_buf(),
            predicate,
            cancel.clone(),
        );

        let semaphore = Arc::new(Semaphore::new(config.threads()));
        let mut active = FuturesUnordered::new();
        let mut last_progress = std::time::Instant::now();
        let mut fatal: Option<CrawlError> = None;

        while let Some(path) = rx.recv().await {
            if cancel.is_cancelled() || fatal.is_some() {
                break;
            }

            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    error!("worker semaphore closed unexpectedly");
                    break;
                }
            };

            let task_pipeline = pipeline.clone();
            let task_path = path.clone();
            let handle = tokio::spawn(async move {
                let _permit = permit;
                task_pipeline.process_discovered(task_path).await
            });
            // The wrapper keeps the path so a panicked task can still be
            // reconciled to an error record.
            active.push(async move { (path, handle.await) });

            // Drain whatever already finished so writer failures stop the
            // run promptly instead of at the end of discovery.
            while let Some(done) = active.next().now_or_never().flatten() {
                if let Some(e) = Self::settle(done, &pipeline, &progress) {
                    fatal = Some(e);
                    cancel.cancel();
                    break;
                }
            }

            if last_progress.elapsed() >= Duration::from_secs(PROGRESS_INTERVAL_SECS) {
                progress.report_periodic(&stats.snapshot());
                last_progress = std::time::Instant::now();
            }
        }
        drop(rx);

        // Wait out the in-flight pipelines.
        while let Some(done) = active.next().await {
            if let Some(e) = Self::settle(done, &pipeline, &progress)
                && fatal.is_none()
            {
                fatal = Some(e);
                cancel.cancel();
            }
        }

        // Final flush happens on every path out, including cancellation.
        let flush_result = writer.flush();
        scratch.cleanup_all();

        if let Some(e) = fatal {
            return Err(e);
        }
        flush_result.map_err(|e| CrawlError::Writer(format!("{e:#}")))?;

        let snapshot = stats.snapshot();
        progress.report_completed(&snapshot);
        info!(
            session_entries = session.count().await.unwrap_or(0),
            output = %output_csv.display(),
            "run finished"
        );

        Ok(CrawlSummary {
            stats: snapshot,
            output_csv,
            cancelled: cancel.is_cancelled(),
        })
    }

    /// Handle one finished worker task; returns a fatal error if the
    /// pipeline hit one. A panicked task already holds its claim, so the
    /// path is reconciled to an empty error record the same way a failed
    /// extraction is.
    fn settle<P: ProgressReporter>(
        done: (std::path::PathBuf, Result<CrawlResult<()>, tokio::task::JoinError>),
        pipeline: &FilePipeline,
        progress: &P,
    ) -> Option<CrawlError> {
        match done {
            (path, Ok(Ok(()))) => {
                progress.report_file_done(&path);
                None
            }
            (path, Ok(Err(e))) => {
                error!(path = %path.display(), error = %e, "pipeline aborted");
                Some(e)
            }
            (path, Err(e)) => {
                warn!(path = %path.display(), error = %e, "worker task panicked");
                match pipeline.record_worker_failure(&path) {
                    Ok(()) => {
                        progress.report_file_done(&path);
                        None
                    }
                    Err(e) => Some(e),
                }
            }
        }
    }
}
