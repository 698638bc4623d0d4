//! Layered configuration loading.
//!
//! Resolution order, weakest first: built-in defaults, the first config file
//! found in the documented search path, `SHARESIFT_*` environment variables.
//! Command-line overrides are applied by the caller on top of the result via
//! `CrawlConfig::builder_from`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use super::types::{CrawlConfig, HashAlgo, SessionBackend};

/// Optional-field mirror of `CrawlConfig` as it appears in the TOML file.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct ConfigFile {
    default_thread_count: Option<usize>,
    command_timeout_seconds: Option<u64>,
    max_recursion_depth: Option<usize>,
    temp_dir: Option<PathBuf>,
    ocr_languages: Option<Vec<String>>,
    ocr_min_text: Option<usize>,
    ocr_max_images: Option<usize>,
    ocr_disabled: Option<bool>,
    audio_disabled: Option<bool>,
    images_dir: Option<PathBuf>,
    exclude_dirs: Option<String>,
    dedupe_enabled: Option<bool>,
    dedupe_hash: Option<String>,
    csv_buffer_bytes: Option<usize>,
    session_backend: Option<String>,
    log_level: Option<String>,
    log_file: Option<PathBuf>,
    output_dir: Option<PathBuf>,
}

/// Documented config file search path, first hit wins.
fn search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("sharesift.toml")];
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("sharesift/config.toml"));
    }
    paths
}

/// Load defaults, overlay the config file (if any), overlay environment.
pub fn load_layered() -> Result<CrawlConfig> {
    let mut config = CrawlConfig::default();

    for path in search_paths() {
        if path.is_file() {
            debug!(path = %path.display(), "loading config file");
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            let file: ConfigFile = toml::from_str(&raw)
                .with_context(|| format!("invalid config file {}", path.display()))?;
            apply_file(&mut config, file)?;
            break;
        }
    }

    apply_env(&mut config)?;
    Ok(config)
}

fn apply_file(config: &mut CrawlConfig, file: ConfigFile) -> Result<()> {
    if let Some(v) = file.default_thread_count {
        config.threads = v;
    }
    if let Some(v) = file.command_timeout_seconds {
        config.command_timeout_secs = v;
    }
    if let Some(v) = file.max_recursion_depth {
        config.max_recursion_depth = v;
    }
    if let Some(v) = file.temp_dir {
        config.temp_dir = v;
    }
    if let Some(v) = file.ocr_languages {
        config.ocr_languages = v;
    }
    if let Some(v) = file.ocr_min_text {
        config.ocr_min_text = v;
    }
    if let Some(v) = file.ocr_max_images {
        config.ocr_max_images = v;
    }
    if let Some(v) = file.ocr_disabled {
        config.ocr_disabled = v;
    }
    if let Some(v) = file.audio_disabled {
        config.audio_disabled = v;
    }
    if let Some(v) = file.images_dir {
        config.images_dir = Some(v);
    }
    if let Some(v) = file.exclude_dirs {
        config.exclude_dirs = split_list(&v);
    }
    if let Some(v) = file.dedupe_enabled {
        config.dedupe_enabled = v;
    }
    if let Some(v) = file.dedupe_hash {
        config.dedupe_hash = v.parse::<HashAlgo>()?;
    }
    if let Some(v) = file.csv_buffer_bytes {
        config.csv_buffer_bytes = v;
    }
    if let Some(v) = file.session_backend {
        config.session_backend = v.parse::<SessionBackend>()?;
    }
    if let Some(v) = file.log_level {
        config.log_level = v;
    }
    if let Some(v) = file.log_file {
        config.log_file = Some(v);
    }
    if let Some(v) = file.output_dir {
        config.output_dir = v;
    }
    Ok(())
}

fn apply_env(config: &mut CrawlConfig) -> Result<()> {
    if let Some(v) = env_var("SHARESIFT_DEFAULT_THREAD_COUNT") {
        config.threads = v.parse().context("SHARESIFT_DEFAULT_THREAD_COUNT")?;
    }
    if let Some(v) = env_var("SHARESIFT_COMMAND_TIMEOUT_SECONDS") {
        config.command_timeout_secs = v.parse().context("SHARESIFT_COMMAND_TIMEOUT_SECONDS")?;
    }
    if let Some(v) = env_var("SHARESIFT_MAX_RECURSION_DEPTH") {
        config.max_recursion_depth = v.parse().context("SHARESIFT_MAX_RECURSION_DEPTH")?;
    }
    if let Some(v) = env_var("SHARESIFT_TEMP_DIR") {
        config.temp_dir = PathBuf::from(v);
    }
    if let Some(v) = env_var("SHARESIFT_OCR_LANGUAGES") {
        config.ocr_languages = split_list(&v);
    }
    if let Some(v) = env_var("SHARESIFT_OCR_MIN_TEXT") {
        config.ocr_min_text = v.parse().context("SHARESIFT_OCR_MIN_TEXT")?;
    }
    if let Some(v) = env_var("SHARESIFT_OCR_MAX_IMAGES") {
        config.ocr_max_images = v.parse().context("SHARESIFT_OCR_MAX_IMAGES")?;
    }
    if let Some(v) = env_var("SHARESIFT_OCR_DISABLED") {
        config.ocr_disabled = parse_bool(&v).context("SHARESIFT_OCR_DISABLED")?;
    }
    if let Some(v) = env_var("SHARESIFT_AUDIO_DISABLED") {
        config.audio_disabled = parse_bool(&v).context("SHARESIFT_AUDIO_DISABLED")?;
    }
    if let Some(v) = env_var("SHARESIFT_IMAGES_DIR") {
        config.images_dir = Some(PathBuf::from(v));
    }
    if let Some(v) = env_var("SHARESIFT_EXCLUDE_DIRS") {
        config.exclude_dirs = split_list(&v);
    }
    if let Some(v) = env_var("SHARESIFT_DEDUPE_ENABLED") {
        config.dedupe_enabled = parse_bool(&v).context("SHARESIFT_DEDUPE_ENABLED")?;
    }
    if let Some(v) = env_var("SHARESIFT_DEDUPE_HASH") {
        config.dedupe_hash = v.parse::<HashAlgo>()?;
    }
    if let Some(v) = env_var("SHARESIFT_CSV_BUFFER_BYTES") {
        config.csv_buffer_bytes = v.parse().context("SHARESIFT_CSV_BUFFER_BYTES")?;
    }
    if let Some(v) = env_var("SHARESIFT_SESSION_BACKEND") {
        config.session_backend = v.parse::<SessionBackend>()?;
    }
    if let Some(v) = env_var("SHARESIFT_LOG_LEVEL") {
        config.log_level = v;
    }
    if let Some(v) = env_var("SHARESIFT_LOG_FILE") {
        config.log_file = Some(PathBuf::from(v));
    }
    if let Some(v) = env_var("SHARESIFT_OUTPUT_DIR") {
        config.output_dir = PathBuf::from(v);
    }
    Ok(())
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn parse_bool(v: &str) -> Result<bool> {
    match v.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("expected a boolean, got '{other}'"),
    }
}

/// Comma-separated list with whitespace trimmed, empties dropped.
fn split_list(v: &str) -> Vec<String> {
    v.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_layer_overrides_defaults() {
        let file: ConfigFile = toml::from_str(
            r#"
            default-thread-count = 12
            dedupe-enabled = true
            dedupe-hash = "sha256"
            exclude-dirs = "$RECYCLE.BIN, System Volume Information"
            "#,
        )
        .expect("parse");

        let mut config = CrawlConfig::default();
        apply_file(&mut config, file).expect("apply");

        assert_eq!(config.threads, 12);
        assert!(config.dedupe_enabled);
        assert_eq!(config.dedupe_hash, HashAlgo::Sha256);
        assert_eq!(
            config.exclude_dirs,
            vec!["$RECYCLE.BIN", "System Volume Information"]
        );
    }

    #[test]
    fn unknown_file_keys_are_rejected() {
        let parsed: Result<ConfigFile, _> = toml::from_str("no-such-key = 1");
        assert!(parsed.is_err());
    }

    #[test]
    fn list_splitting_trims_and_drops_empties() {
        assert_eq!(split_list("a, b,,c "), vec!["a", "b", "c"]);
        assert!(split_list("").is_empty());
    }
}
