//! Type-safe builder for `CrawlConfig` using the typestate pattern.
//!
//! The crawl root is the one required field; `build()` exists only once it
//! has been supplied.

use std::marker::PhantomData;
use std::path::PathBuf;

use super::types::{CrawlConfig, HashAlgo, SessionBackend};

// Type states for the builder
pub struct WithRoot;

pub struct CrawlConfigBuilder<State = ()> {
    config: CrawlConfig,
    _phantom: PhantomData<State>,
}

impl CrawlConfig {
    #[must_use]
    pub fn builder() -> CrawlConfigBuilder<()> {
        CrawlConfigBuilder {
            config: CrawlConfig::default(),
            _phantom: PhantomData,
        }
    }

    /// Builder seeded from an already-layered config (file + env), for CLI
    /// overrides on top.
    #[must_use]
    pub fn builder_from(config: CrawlConfig) -> CrawlConfigBuilder<()> {
        CrawlConfigBuilder {
            config,
            _phantom: PhantomData,
        }
    }
}

impl CrawlConfigBuilder<()> {
    #[must_use]
    pub fn root(self, root: impl Into<PathBuf>) -> CrawlConfigBuilder<WithRoot> {
        let mut config = self.config;
        config.root = root.into();
        CrawlConfigBuilder {
            config,
            _phantom: PhantomData,
        }
    }
}

impl<State> CrawlConfigBuilder<State> {
    #[must_use]
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    #[must_use]
    pub fn threads(mut self, n: usize) -> Self {
        self.config.threads = n;
        self
    }

    #[must_use]
    pub fn command_timeout_secs(mut self, secs: u64) -> Self {
        self.config.command_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn max_recursion_depth(mut self, depth: usize) -> Self {
        self.config.max_recursion_depth = depth;
        self
    }

    #[must_use]
    pub fn temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.temp_dir = dir.into();
        self
    }

    #[must_use]
    pub fn ocr_languages(mut self, langs: Vec<String>) -> Self {
        self.config.ocr_languages = langs;
        self
    }

    #[must_use]
    pub fn ocr_min_text(mut self, chars: usize) -> Self {
        self.config.ocr_min_text = chars;
        self
    }

    #[must_use]
    pub fn ocr_max_images(mut self, cap: usize) -> Self {
        self.config.ocr_max_images = cap;
        self
    }

    #[must_use]
    pub fn ocr_disabled(mut self, disabled: bool) -> Self {
        self.config.ocr_disabled = disabled;
        self
    }

    #[must_use]
    pub fn audio_disabled(mut self, disabled: bool) -> Self {
        self.config.audio_disabled = disabled;
        self
    }

    #[must_use]
    pub fn images_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.config.images_dir = dir;
        self
    }

    #[must_use]
    pub fn exclude_dirs(mut self, patterns: Vec<String>) -> Self {
        self.config.exclude_dirs = patterns;
        self
    }

    #[must_use]
    pub fn dedupe(mut self, enabled: bool, algo: HashAlgo) -> Self {
        self.config.dedupe_enabled = enabled;
        self.config.dedupe_hash = algo;
        self
    }

    #[must_use]
    pub fn csv_buffer_bytes(mut self, bytes: usize) -> Self {
        self.config.csv_buffer_bytes = bytes;
        self
    }

    #[must_use]
    pub fn session_backend(mut self, backend: SessionBackend) -> Self {
        self.config.session_backend = backend;
        self
    }

    #[must_use]
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.config.log_level = level.into();
        self
    }

    #[must_use]
    pub fn log_file(mut self, file: Option<PathBuf>) -> Self {
        self.config.log_file = file;
        self
    }

    #[must_use]
    pub fn lock_output(mut self, lock: bool) -> Self {
        self.config.lock_output = lock;
        self
    }
}

impl CrawlConfigBuilder<WithRoot> {
    /// Finalize the configuration. Cross-field validation happens in
    /// `CrawlConfig::validate` at engine start, not here.
    #[must_use]
    pub fn build(self) -> CrawlConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_requires_root_then_builds() {
        let config = CrawlConfig::builder()
            .threads(8)
            .root("smb/fs01/share")
            .dedupe(true, HashAlgo::Sha256)
            .build();
        assert_eq!(config.threads, 8);
        assert!(config.dedupe_enabled);
        assert_eq!(config.root, PathBuf::from("smb/fs01/share"));
    }
}
