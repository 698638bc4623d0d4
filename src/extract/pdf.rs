//! PDF extraction.
//!
//! Primary pass is `pdftotext`. When the text layer is sparse the engine
//! asks for the embedded images, which `pdfimages` drops into scratch for
//! OCR re-entry.

use std::path::Path;

use anyhow::{Context, Result};

use super::{Extraction, ExtractContext, normalize_text};
use crate::command::CommandSpec;
use crate::scratch::ScratchDir;

pub async fn extract(path: &Path, ctx: &ExtractContext<'_>) -> Result<Extraction> {
    // Damaged PDFs make pdftotext exit non-zero while still writing usable
    // text; partial reads count as successful extractions.
    let output = CommandSpec::new("pdftotext")
        .arg("-q")
        .arg(path)
        .arg("-")
        .run_lenient(ctx.deadline, ctx.cancel)
        .await
        .context("pdftotext failed")?;
    Ok(Extraction::text_only(normalize_text(&output.stdout_text())))
}

/// Drop every embedded image into scratch as `img-NNN.jpg`/`.ppm`.
/// Returns whether anything landed.
pub async fn extract_images(
    path: &Path,
    scratch: &ScratchDir,
    ctx: &ExtractContext<'_>,
) -> Result<bool> {
    CommandSpec::new("pdfimages")
        .arg("-j")
        .arg(path)
        .arg(scratch.path().join("img"))
        .run_lenient(ctx.deadline, ctx.cancel)
        .await
        .context("pdfimages failed")?;
    Ok(!scratch.is_empty())
}
