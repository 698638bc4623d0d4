//! Getter methods for `CrawlConfig`.

use std::path::{Path, PathBuf};

use super::types::{CrawlConfig, HashAlgo, SessionBackend};

impl CrawlConfig {
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    #[must_use]
    pub fn threads(&self) -> usize {
        self.threads
    }

    #[must_use]
    pub fn command_timeout_secs(&self) -> u64 {
        self.command_timeout_secs
    }

    #[must_use]
    pub fn max_recursion_depth(&self) -> usize {
        self.max_recursion_depth
    }

    #[must_use]
    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    #[must_use]
    pub fn ocr_languages(&self) -> &[String] {
        &self.ocr_languages
    }

    /// Languages joined for tools that take a single `+`-separated list.
    #[must_use]
    pub fn ocr_language_arg(&self) -> String {
        self.ocr_languages.join("+")
    }

    #[must_use]
    pub fn ocr_min_text(&self) -> usize {
        self.ocr_min_text
    }

    #[must_use]
    pub fn ocr_max_images(&self) -> usize {
        self.ocr_max_images
    }

    #[must_use]
    pub fn ocr_disabled(&self) -> bool {
        self.ocr_disabled
    }

    #[must_use]
    pub fn audio_disabled(&self) -> bool {
        self.audio_disabled
    }

    #[must_use]
    pub fn images_dir(&self) -> Option<&PathBuf> {
        self.images_dir.as_ref()
    }

    #[must_use]
    pub fn exclude_dirs(&self) -> &[String] {
        &self.exclude_dirs
    }

    #[must_use]
    pub fn dedupe_enabled(&self) -> bool {
        self.dedupe_enabled
    }

    #[must_use]
    pub fn dedupe_hash(&self) -> HashAlgo {
        self.dedupe_hash
    }

    #[must_use]
    pub fn csv_buffer_bytes(&self) -> usize {
        self.csv_buffer_bytes
    }

    #[must_use]
    pub fn session_backend(&self) -> SessionBackend {
        self.session_backend
    }

    #[must_use]
    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    #[must_use]
    pub fn log_file(&self) -> Option<&PathBuf> {
        self.log_file.as_ref()
    }

    #[must_use]
    pub fn lock_output(&self) -> bool {
        self.lock_output
    }
}
