//! File discovery.
//!
//! Walks the crawl root in parallel and streams every regular file that
//! passes the predicate into a bounded channel the worker pool consumes.
//! Enumeration order is unspecified. A cheap pre-pass computes the total
//! estimate used for progress reporting.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Size, path, name and mtime filters applied during discovery.
#[derive(Debug, Default, Clone)]
pub struct DiscoveryPredicate {
    pub min_size: Option<u64>,
    pub max_size: Option<u64>,
    /// Substring exclusions applied to the full path.
    pub exclude_substrings: Vec<String>,
    /// Filename glob patterns; a file must match at least one when set.
    /// Built via `with_name_patterns`.
    pub name_globs: Option<GlobSet>,
    pub mtime_after: Option<SystemTime>,
    pub mtime_before: Option<SystemTime>,
}

impl DiscoveryPredicate {
    /// Compile filename glob patterns into the predicate.
    pub fn with_name_patterns(mut self, patterns: &[String]) -> Result<Self> {
        if patterns.is_empty() {
            self.name_globs = None;
            return Ok(self);
        }
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            builder.add(
                Glob::new(pattern).with_context(|| format!("invalid name pattern '{pattern}'"))?,
            );
        }
        self.name_globs = Some(builder.build().context("failed to compile name patterns")?);
        Ok(self)
    }

    /// Decide whether a regular file enters the pipeline.
    #[must_use]
    pub fn matches(&self, path: &Path, metadata: &std::fs::Metadata) -> bool {
        let len = metadata.len();
        if let Some(min) = self.min_size
            && len < min
        {
            return false;
        }
        if let Some(max) = self.max_size
            && len > max
        {
            return false;
        }

        let path_str = path.to_string_lossy();
        if self
            .exclude_substrings
            .iter()
            .any(|pat| path_str.contains(pat.as_str()))
        {
            return false;
        }

        if let Some(globs) = &self.name_globs {
            let matched = path
                .file_name()
                .map(|name| globs.is_match(Path::new(name)))
                .unwrap_or(false);
            if !matched {
                return false;
            }
        }

        if let Ok(mtime) = metadata.modified() {
            if let Some(after) = self.mtime_after
                && mtime < after
            {
                return false;
            }
            if let Some(before) = self.mtime_before
                && mtime > before
            {
                return false;
            }
        }

        true
    }
}

/// Count matching files for the progress estimate. Unreadable subtrees are
/// logged and skipped, exactly as the streaming pass does.
pub async fn estimate_total(root: PathBuf, predicate: DiscoveryPredicate) -> Result<u64> {
    tokio::task::spawn_blocking(move || {
        let mut count = 0u64;
        for entry in jwalk::WalkDir::new(&root).skip_hidden(false) {
            match entry {
                Ok(entry) if entry.file_type().is_file() => {
                    let path = entry.path();
                    if let Ok(metadata) = std::fs::metadata(&path)
                        && predicate.matches(&path, &metadata)
                    {
                        count += 1;
                    }
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "discovery estimate: unreadable entry"),
            }
        }
        count
    })
    .await
    .context("estimate task panicked")
}

/// Stream matching files into a bounded channel from the blocking pool.
///
/// The stream stops early when the engine is cancelled or the receiver is
/// dropped; unreadable directories are logged at WARN and enumeration
/// continues past them.
pub fn spawn_discovery(
    root: PathBuf,
    predicate: DiscoveryPredicate,
    cancel: CancellationToken,
) -> mpsc::Receiver<PathBuf> {
    let (tx, rx) = mpsc::channel(1024);

    tokio::task::spawn_blocking(move || {
        for entry in jwalk::WalkDir::new(&root).skip_hidden(false) {
            if cancel.is_cancelled() {
                debug!("discovery cancelled");
                break;
            }
            match entry {
                Ok(entry) if entry.file_type().is_file() => {
                    let path = entry.path();
                    let passes = std::fs::metadata(&path)
                        .map(|m| predicate.matches(&path, &m))
                        .unwrap_or(false);
                    if passes && tx.blocking_send(path).is_err() {
                        // Receiver dropped: the engine is shutting down.
                        break;
                    }
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "unreadable directory entry, continuing"),
            }
        }
    });

    rx
}
