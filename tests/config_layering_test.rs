//! Layered configuration: environment variables override built-in defaults.
//!
//! Kept to a single test because environment mutation is process-global.

use sharesift::config::{self, HashAlgo, SessionBackend};

#[test]
fn environment_overrides_defaults() {
    // SAFETY: this is the only test in this binary touching the environment.
    unsafe {
        std::env::set_var("SHARESIFT_DEFAULT_THREAD_COUNT", "9");
        std::env::set_var("SHARESIFT_DEDUPE_ENABLED", "true");
        std::env::set_var("SHARESIFT_DEDUPE_HASH", "sha1");
        std::env::set_var("SHARESIFT_SESSION_BACKEND", "append-text");
        std::env::set_var("SHARESIFT_EXCLUDE_DIRS", "$RECYCLE.BIN,.git");
        std::env::set_var("SHARESIFT_OCR_MIN_TEXT", "42");
    }

    let config = config::load_layered().expect("load");
    assert_eq!(config.threads(), 9);
    assert!(config.dedupe_enabled());
    assert_eq!(config.dedupe_hash(), HashAlgo::Sha1);
    assert_eq!(config.session_backend(), SessionBackend::Text);
    assert_eq!(config.exclude_dirs(), ["$RECYCLE.BIN", ".git"]);
    assert_eq!(config.ocr_min_text(), 42);

    // Untouched keys keep their defaults.
    assert_eq!(config.command_timeout_secs(), 60);
    assert_eq!(config.max_recursion_depth(), 5);
    assert_eq!(config.csv_buffer_bytes(), 64 * 1024);
}
