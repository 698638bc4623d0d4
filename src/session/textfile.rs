//! Flocked append-text store backend.
//!
//! One key per line, appended under an exclusive file lock. The in-memory
//! set is authoritative after open because the single-process single-worker
//! invariant holds whenever this backend is selected; the flock guards
//! against a second process being pointed at the same file by mistake.

use std::collections::HashSet;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;
use parking_lot::Mutex;

pub struct TextSet {
    path: PathBuf,
    seen: Mutex<HashSet<String>>,
}

impl TextSet {
    /// Open or create the backing file and load existing keys.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create store dir {}", parent.display()))?;
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(path)
            .with_context(|| format!("failed to open text store {}", path.display()))?;

        let mut seen = HashSet::new();
        for line in BufReader::new(&file).lines() {
            let line = line?;
            if !line.is_empty() {
                seen.insert(line);
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            seen: Mutex::new(seen),
        })
    }

    /// Insert-if-absent. The append happens under an exclusive flock and is
    /// flushed before the claim is reported won.
    pub fn claim(&self, key: &str) -> std::io::Result<bool> {
        let mut seen = self.seen.lock();
        if seen.contains(key) {
            return Ok(false);
        }

        let mut file = std::fs::OpenOptions::new().append(true).open(&self.path)?;
        file.lock_exclusive()?;
        let result = writeln!(file, "{key}").and_then(|()| file.flush());
        let unlock = fs2::FileExt::unlock(&file);
        result?;
        unlock?;

        seen.insert(key.to_string());
        Ok(true)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.seen.lock().contains(key)
    }

    pub fn count(&self) -> u64 {
        self.seen.lock().len() as u64
    }
}
