//! The per-file pipeline: claim, classify, dedup, extract, expand, emit.
//!
//! One worker runs one file's pipeline to completion, including its whole
//! nested expansion, so a parent record and all of its children are emitted
//! within one worker's serial stream — and the parent's own record goes out
//! only after every child has returned. Depth and parent linkage travel as
//! explicit `FileTask` fields.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::types::{CrawlError, CrawlResult, FileTask};
use crate::classify::{self, DocClass, Expansion, RegistryEntry};
use crate::config::CrawlConfig;
use crate::extract::{self, ExtractContext};
use crate::mapper::{UrlMapper, extension_of};
use crate::scratch::{ScratchDir, ScratchManager};
use crate::session::{DedupStore, SessionStore, hash_file};
use crate::stats::CrawlStats;
use crate::writer::{FileRecord, IndexWriter, clean_content};

/// All pipeline dependencies, threaded explicitly. Cheap to clone: every
/// field is a handle.
#[derive(Clone)]
pub(crate) struct FilePipeline {
    pub config: Arc<CrawlConfig>,
    pub session: Arc<SessionStore>,
    pub dedup: Option<Arc<DedupStore>>,
    pub writer: Arc<IndexWriter>,
    pub scratch: ScratchManager,
    pub stats: Arc<CrawlStats>,
    pub mapper: UrlMapper,
    pub cancel: CancellationToken,
}

impl FilePipeline {
    /// Entry point for a file found by discovery: claim it, then run the
    /// pipeline. Only writer failures propagate; everything else is a
    /// per-file outcome recorded in the counters.
    pub async fn process_discovered(&self, path: PathBuf) -> CrawlResult<()> {
        let key = path.to_string_lossy().into_owned();
        match self.session.claim(&key).await {
            Ok(true) => {}
            Ok(false) => {
                debug!(path = %path.display(), "already claimed, skipping");
                self.stats.record_skipped();
                return Ok(());
            }
            Err(e) => {
                // Claim failures other than "duplicate" are per-file errors;
                // the file is not re-attempted this run.
                warn!(path = %path.display(), error = %e, "claim failed");
                self.stats.record_error();
                return Ok(());
            }
        }

        let task = FileTask {
            url: self.mapper.logical_url(&path),
            physical_path: path.clone(),
            path,
            depth: 0,
        };
        self.process_task(task).await
    }

    /// Run classify → dedup → extract → nested expansion → emit for one
    /// task. Boxed because nested expansion recurses.
    fn process_task<'a>(
        &'a self,
        task: FileTask,
    ) -> Pin<Box<dyn Future<Output = CrawlResult<()>> + Send + 'a>> {
        Box::pin(async move {
            if self.cancel.is_cancelled() {
                return Ok(());
            }

            let mime = classify::detect_mime(&task.path).await;
            let entry = classify::resolve(&mime);
            debug!(
                path = %task.path.display(),
                mime = %mime,
                class = %entry.class,
                depth = task.depth,
                "classified"
            );

            if let Some(dedup) = &self.dedup
                && self.is_duplicate(dedup, &task).await
            {
                self.stats.record_skipped();
                return Ok(());
            }

            let ctx = ExtractContext {
                config: &self.config,
                scratch: &self.scratch,
                cancel: &self.cancel,
                deadline: self.config.timeout_for(entry.timeout),
            };

            let extraction =
                match extract::extract(entry.class, entry.expansion, &task.path, &ctx).await {
                    Ok(extraction) => extraction,
                    Err(e) => {
                        // Timeouts and tool failures are full failures: empty
                        // content, class preserved, no expansion.
                        warn!(path = %task.path.display(), class = %entry.class, error = %e, "extraction failed");
                        self.stats.record_error();
                        self.emit(&task, entry.class, String::new())?;
                        return Ok(());
                    }
                };

            // Children are processed (and emitted) before the parent record.
            if let Some(scratch_dir) = &extraction.scratch {
                self.expand_nested(&task, entry, scratch_dir).await?;
            }

            self.emit(&task, entry.class, extraction.text)?;
            self.stats.record_processed();
            Ok(())
        })
    }

    /// Content-hash dedup. A store or hashing failure disables dedup for
    /// this file rather than failing it.
    async fn is_duplicate(&self, dedup: &DedupStore, task: &FileTask) -> bool {
        let digest = match hash_file(&task.path, self.config.dedupe_hash()).await {
            Ok(digest) => digest,
            Err(e) => {
                warn!(path = %task.path.display(), error = %e, "hashing failed, dedup skipped");
                return false;
            }
        };
        match dedup
            .claim(&digest, &task.physical_path.to_string_lossy())
            .await
        {
            Ok(true) => false,
            Ok(false) => {
                debug!(path = %task.path.display(), digest = %digest, "duplicate content, suppressing record");
                true
            }
            Err(e) => {
                warn!(path = %task.path.display(), error = %e, "dedup claim failed, dedup skipped");
                false
            }
        }
    }

    /// Process a container's payload as freshly discovered files, bounded by
    /// depth and the per-expansion fan-out cap. Whatever falls over a limit
    /// is dropped with a warning counter.
    async fn expand_nested(
        &self,
        parent: &FileTask,
        entry: &RegistryEntry,
        scratch_dir: &ScratchDir,
    ) -> CrawlResult<()> {
        let entries = match scratch_dir.entries() {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %parent.path.display(), error = %e, "failed to enumerate scratch");
                return Ok(());
            }
        };
        if entries.is_empty() {
            return Ok(());
        }

        if parent.depth >= self.config.max_recursion_depth() {
            warn!(
                path = %parent.path.display(),
                depth = parent.depth,
                dropped = entries.len(),
                "recursion depth limit reached, dropping nested files"
            );
            for _ in &entries {
                self.stats.record_nested_dropped();
            }
            return Ok(());
        }

        let cap = match entry.expansion {
            Expansion::SparseMedia | Expansion::UnpackCapped => Some(self.config.ocr_max_images()),
            Expansion::Unpack | Expansion::None => None,
        };

        for (index, nested_path) in entries.iter().enumerate() {
            if self.cancel.is_cancelled() {
                return Ok(());
            }
            if let Some(cap) = cap
                && index >= cap
            {
                let dropped = entries.len() - index;
                warn!(
                    path = %parent.path.display(),
                    cap,
                    dropped,
                    "fan-out cap reached, dropping remaining nested files"
                );
                for _ in 0..dropped {
                    self.stats.record_nested_dropped();
                }
                break;
            }

            let name = nested_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| format!("nested-{index}"));

            let nested_task = FileTask {
                path: nested_path.clone(),
                physical_path: parent.physical_path.clone(),
                url: UrlMapper::nested_url(&parent.url, &name),
                depth: parent.depth + 1,
            };
            self.process_task(nested_task).await?;
        }

        Ok(())
    }

    /// Reconcile a claimed path whose worker task died before finishing:
    /// empty content, class `unknown` (classification may not have run),
    /// counted as an error. Every claimed path ends up with exactly one
    /// emitted record unless it was deduplicated.
    pub(crate) fn record_worker_failure(&self, path: &std::path::Path) -> CrawlResult<()> {
        self.stats.record_error();
        let task = FileTask {
            url: self.mapper.logical_url(path),
            physical_path: path.to_path_buf(),
            path: path.to_path_buf(),
            depth: 0,
        };
        self.emit(&task, DocClass::Unknown, String::new())
    }

    /// Build and hand one record to the index writer. Writer errors are the
    /// only fatal per-file outcome.
    fn emit(&self, task: &FileTask, class: DocClass, text: String) -> CrawlResult<()> {
        let record = FileRecord {
            timestamp: chrono::Utc::now().timestamp(),
            logical_url: task.url.clone(),
            physical_path: task.physical_path.to_string_lossy().into_owned(),
            server: self.mapper.server().to_string(),
            share: self.mapper.share().to_string(),
            extension: extension_of(&task.path),
            class,
            content: clean_content(&text),
        };
        self.writer
            .append(&record)
            .map_err(|e| CrawlError::Writer(format!("{e:#}")))
    }
}
