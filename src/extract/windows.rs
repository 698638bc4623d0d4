//! Windows-specific artifact extraction.
//!
//! Shortcut metadata, binary string dumps, Explorer thumbnail caches and
//! event logs all carry audit-relevant text. Thumbs.db additionally expands
//! into scratch: its thumbnails re-enter the pipeline as images.

use std::path::Path;

use anyhow::{Context, Result};

use super::{Extraction, ExtractContext, normalize_text};
use crate::command::CommandSpec;

/// Shortcut (.lnk) metadata: target path, arguments, icon location.
pub async fn extract_lnk(path: &Path, ctx: &ExtractContext<'_>) -> Result<Extraction> {
    let output = CommandSpec::new("lnkinfo")
        .arg(path)
        .run_lenient(ctx.deadline, ctx.cancel)
        .await
        .context("lnkinfo failed")?;
    Ok(Extraction::text_only(normalize_text(&output.stdout_text())))
}

/// Printable-string dump of PE and ELF binaries.
pub async fn extract_strings(path: &Path, ctx: &ExtractContext<'_>) -> Result<Extraction> {
    let output = CommandSpec::new("strings")
        .arg("-n")
        .arg("6")
        .arg(path)
        .run(ctx.deadline, ctx.cancel)
        .await
        .context("strings failed")?;
    Ok(Extraction::text_only(normalize_text(&output.stdout_text())))
}

/// Thumbs.db caches: thumbnails into scratch for image re-entry.
pub async fn extract_thumbs(path: &Path, ctx: &ExtractContext<'_>) -> Result<Extraction> {
    let scratch = ctx.scratch.allocate()?;
    let output = CommandSpec::new("vinetto")
        .arg("-o")
        .arg(scratch.path())
        .arg(path)
        .run_lenient(ctx.deadline, ctx.cancel)
        .await
        .context("vinetto failed")?;
    Ok(Extraction {
        text: normalize_text(&output.stdout_text()),
        scratch: if scratch.is_empty() {
            None
        } else {
            Some(scratch)
        },
    })
}

/// EVTX event logs dumped as JSON lines.
pub async fn extract_evtx(path: &Path, ctx: &ExtractContext<'_>) -> Result<Extraction> {
    let output = CommandSpec::new("evtx_dump")
        .arg("--no-confirm-overwrite")
        .arg("-o")
        .arg("jsonl")
        .arg(path)
        .run(ctx.deadline, ctx.cancel)
        .await
        .context("evtx_dump failed")?;
    Ok(Extraction::text_only(normalize_text(&output.stdout_text())))
}
