//! Configuration module for crawl runs.
//!
//! This module provides the `CrawlConfig` struct, its type-safe builder, the
//! layered loader (defaults < config file < environment < CLI) and the
//! strict-permission secrets file for downstream collaborators.

// Sub-modules
pub mod builder;
pub mod getters;
pub mod loader;
pub mod secrets;
pub mod types;

// Re-exports for public API
pub use builder::{CrawlConfigBuilder, WithRoot};
pub use loader::load_layered;
pub use secrets::Secrets;
pub use types::{CrawlConfig, HashAlgo, SessionBackend};
