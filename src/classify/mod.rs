//! File classification.
//!
//! An external MIME probe (`file --mime-type`) feeds an ordered pattern
//! registry that normalizes the probe result into a closed set of document
//! classes. The registry is the single dispatch table of the engine: every
//! class carries its extractor's timeout category and nested-expansion
//! behavior.

pub mod probe;
pub mod registry;

pub use probe::{detect_mime, is_textual};
pub use registry::{DocClass, Expansion, RegistryEntry, TimeoutClass, resolve};
