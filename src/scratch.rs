//! Bounded temp directories with guaranteed cleanup.
//!
//! Adapters that unpack containers write into a `ScratchDir` allocated here.
//! Every allocation is registered; a dir is removed when its handle drops
//! (normal per-file completion or error) and `cleanup_all` sweeps whatever
//! remains on signal-triggered shutdown. Siblings never share a dir: each
//! allocation is owned by exactly one worker's current file.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result};
use parking_lot::Mutex;
use tracing::{debug, warn};

/// Allocates uniquely-named scratch directories under one temp root.
#[derive(Debug, Clone)]
pub struct ScratchManager {
    temp_root: PathBuf,
    registry: Arc<Mutex<HashSet<PathBuf>>>,
    counter: Arc<AtomicU64>,
}

impl ScratchManager {
    /// Create a manager rooted at `temp_root`, creating the root if needed.
    pub fn new(temp_root: impl Into<PathBuf>) -> Result<Self> {
        let temp_root = temp_root.into();
        std::fs::create_dir_all(&temp_root)
            .with_context(|| format!("failed to create temp root {}", temp_root.display()))?;
        Ok(Self {
            temp_root,
            registry: Arc::new(Mutex::new(HashSet::new())),
            counter: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Allocate an empty uniquely-named directory and register it for
    /// cleanup. The returned handle removes the directory on drop.
    pub fn allocate(&self) -> Result<ScratchDir> {
        let seq = self.counter.fetch_add(1, Ordering::Relaxed);
        let name = format!("sift-{}-{seq}", std::process::id());
        let path = self.temp_root.join(name);
        std::fs::create_dir_all(&path)
            .with_context(|| format!("failed to create scratch dir {}", path.display()))?;
        self.registry.lock().insert(path.clone());
        debug!(path = %path.display(), "allocated scratch dir");
        Ok(ScratchDir {
            path,
            registry: Arc::clone(&self.registry),
        })
    }

    /// Remove every registered directory. Called on shutdown after in-flight
    /// workers have been cancelled; also safe to call twice.
    pub fn cleanup_all(&self) {
        let paths: Vec<PathBuf> = self.registry.lock().drain().collect();
        for path in paths {
            remove_scratch(&path);
        }
    }

    /// Number of live allocations. Test and diagnostics hook.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.registry.lock().len()
    }

    #[must_use]
    pub fn temp_root(&self) -> &Path {
        &self.temp_root
    }
}

/// One allocated scratch directory. Dropping the handle removes the
/// directory and deregisters it.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
    registry: Arc<Mutex<HashSet<PathBuf>>>,
}

impl ScratchDir {
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Regular files currently inside the dir, sorted by name so nested
    /// processing order is deterministic for a given container.
    pub fn entries(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        collect_files(&self.path, &mut files)?;
        files.sort();
        Ok(files)
    }

    /// True when no extractor wrote anything here.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries().map(|e| e.is_empty()).unwrap_or(true)
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if self.registry.lock().remove(&self.path) {
            remove_scratch(&self.path);
        }
    }
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read scratch dir {}", dir.display()))?
    {
        let entry = entry?;
        let ty = entry.file_type()?;
        if ty.is_file() {
            out.push(entry.path());
        } else if ty.is_dir() {
            // Extractors may recreate a container's internal tree.
            collect_files(&entry.path(), out)?;
        }
    }
    Ok(())
}

fn remove_scratch(path: &Path) {
    if let Err(e) = std::fs::remove_dir_all(path)
        && path.exists()
    {
        warn!(path = %path.display(), error = %e, "failed to remove scratch dir");
    }
}
