//! Core configuration types for crawl runs.
//!
//! This module contains the main `CrawlConfig` struct and its associated
//! types. Values are resolved in layers before a run starts: built-in
//! defaults, then the on-disk config file, then `SHARESIFT_*` environment
//! variables, then command-line overrides.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Hash algorithm for the dedup store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgo {
    Md5,
    Sha1,
    Sha256,
}

impl HashAlgo {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
        }
    }
}

impl std::str::FromStr for HashAlgo {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "md5" => Ok(Self::Md5),
            "sha1" => Ok(Self::Sha1),
            "sha256" => Ok(Self::Sha256),
            other => Err(anyhow::anyhow!("unknown dedupe hash algorithm '{other}'")),
        }
    }
}

/// Backend for the session and dedup stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    /// Embedded SQLite with an atomic insert-if-absent claim. Safe across
    /// workers and processes.
    Sqlite,
    /// Flocked append-text file. Valid only with a single process and a
    /// single worker; config validation enforces that.
    Text,
}

impl std::str::FromStr for SessionBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sqlite" | "relational" => Ok(Self::Sqlite),
            "text" | "append-text" => Ok(Self::Text),
            other => Err(anyhow::anyhow!("unknown session backend '{other}'")),
        }
    }
}

/// Main configuration for a crawl run.
///
/// **INVARIANT:** `root` is set before `build()` succeeds; the builder's
/// typestate enforces this at compile time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Crawl root on the local filesystem.
    pub(crate) root: PathBuf,
    /// Directory receiving the CSV output and store files.
    pub(crate) output_dir: PathBuf,
    /// Worker concurrency.
    pub(crate) threads: usize,
    /// Default extractor deadline in seconds.
    pub(crate) command_timeout_secs: u64,
    /// Nested expansion bound.
    pub(crate) max_recursion_depth: usize,
    /// Scratch root.
    pub(crate) temp_dir: PathBuf,
    /// Ordered language list passed to OCR and transcription tools.
    pub(crate) ocr_languages: Vec<String>,
    /// Sparse-text threshold in characters triggering media expansion.
    pub(crate) ocr_min_text: usize,
    /// Per-document fan-out cap for OCR re-entry.
    pub(crate) ocr_max_images: usize,
    /// Skip all media expansion.
    pub(crate) ocr_disabled: bool,
    /// Skip audio transcription.
    pub(crate) audio_disabled: bool,
    /// When set, save resized thumbnails of each image here.
    pub(crate) images_dir: Option<PathBuf>,
    /// Substring exclusions applied to paths during discovery.
    pub(crate) exclude_dirs: Vec<String>,
    pub(crate) dedupe_enabled: bool,
    pub(crate) dedupe_hash: HashAlgo,
    /// Index writer buffer size in bytes.
    pub(crate) csv_buffer_bytes: usize,
    pub(crate) session_backend: SessionBackend,
    pub(crate) log_level: String,
    pub(crate) log_file: Option<PathBuf>,
    /// Lock the CSV file exclusively during appends. Required when multiple
    /// processes share one output file.
    pub(crate) lock_output: bool,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::new(),
            output_dir: PathBuf::from("."),
            threads: 4,
            command_timeout_secs: 60,
            max_recursion_depth: 5,
            temp_dir: std::env::temp_dir(),
            ocr_languages: vec!["eng".to_string()],
            ocr_min_text: 100,
            ocr_max_images: 10,
            ocr_disabled: false,
            audio_disabled: false,
            images_dir: None,
            exclude_dirs: Vec::new(),
            dedupe_enabled: false,
            dedupe_hash: HashAlgo::Md5,
            csv_buffer_bytes: 64 * 1024,
            session_backend: SessionBackend::Sqlite,
            log_level: "info".to_string(),
            log_file: None,
            lock_output: false,
        }
    }
}

impl CrawlConfig {
    /// Extractor deadline for a timeout category, in seconds.
    #[must_use]
    pub fn timeout_for(&self, class: crate::classify::TimeoutClass) -> std::time::Duration {
        use crate::classify::TimeoutClass;
        let secs = match class {
            TimeoutClass::Default => self.command_timeout_secs,
            TimeoutClass::Image => 120,
            TimeoutClass::Audio => 300,
        };
        std::time::Duration::from_secs(secs)
    }

    /// Validate cross-field constraints before the engine starts.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.root.is_dir() {
            anyhow::bail!("crawl root {} is not a directory", self.root.display());
        }
        if self.threads == 0 {
            anyhow::bail!("thread count must be at least 1");
        }
        if self.session_backend == SessionBackend::Text && self.threads > 1 {
            anyhow::bail!(
                "the append-text session backend requires a single worker; \
                 lower the thread count or switch to the sqlite backend"
            );
        }
        Ok(())
    }

    /// Name of the CSV output file: the root path with separators replaced
    /// by underscores, `.csv` appended.
    #[must_use]
    pub fn output_csv_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.csv", self.root_slug()))
    }

    /// Hidden session store file next to the CSV output.
    #[must_use]
    pub fn session_db_path(&self) -> PathBuf {
        self.output_dir
            .join(format!(".{}.session.db", self.root_slug()))
    }

    /// Hidden dedup store file next to the CSV output.
    #[must_use]
    pub fn dedupe_db_path(&self) -> PathBuf {
        self.output_dir
            .join(format!(".{}.dedupe.db", self.root_slug()))
    }

    fn root_slug(&self) -> String {
        self.root
            .to_string_lossy()
            .trim_matches('/')
            .replace(['/', '\\'], "_")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_paths_derive_from_root() {
        let config = CrawlConfig {
            root: PathBuf::from("smb/fs01/share"),
            ..Default::default()
        };
        assert_eq!(
            config.output_csv_path(),
            PathBuf::from("./smb_fs01_share.csv")
        );
        assert_eq!(
            config.session_db_path(),
            PathBuf::from("./.smb_fs01_share.session.db")
        );
        assert_eq!(
            config.dedupe_db_path(),
            PathBuf::from("./.smb_fs01_share.dedupe.db")
        );
    }

    #[test]
    fn text_backend_rejects_parallel_workers() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = CrawlConfig {
            root: dir.path().to_path_buf(),
            session_backend: SessionBackend::Text,
            threads: 4,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = CrawlConfig {
            threads: 1,
            ..config
        };
        assert!(config.validate().is_ok());
    }
}
