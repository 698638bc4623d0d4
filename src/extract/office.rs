//! Office document extraction.
//!
//! Two generations share each class tag: OLE-era compound files handled by
//! the catdoc family, and zip-over-xml packages read through `unzip`. The
//! adapter sniffs the zip magic instead of trusting the extension, because
//! audited shares are full of renamed files.
//!
//! Packaged documents also expose media extraction: embedded images are
//! unpacked into scratch when the engine asks, feeding OCR re-entry for
//! text-sparse documents.

use std::path::Path;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;

use super::{Extraction, ExtractContext, normalize_text};
use crate::command::CommandSpec;
use crate::scratch::ScratchDir;

static XML_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]+>").expect("static regex"));

/// Zip local-file-header magic.
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4b, 0x03, 0x04];

async fn is_zip_package(path: &Path) -> bool {
    let mut head = [0u8; 4];
    match tokio::fs::File::open(path).await {
        Ok(mut f) => {
            use tokio::io::AsyncReadExt;
            f.read_exact(&mut head).await.is_ok() && head == ZIP_MAGIC
        }
        Err(_) => false,
    }
}

/// Flatten document XML to text. Tags become spaces so adjacent runs do not
/// fuse into one token.
fn xml_to_text(xml: &str) -> String {
    normalize_text(&XML_TAGS.replace_all(xml, " "))
}

/// Read named parts out of a zip package, concatenated. Wildcard patterns
/// are resolved by `unzip` itself; missing parts are tolerated.
async fn read_zip_parts(
    path: &Path,
    parts: &[&str],
    ctx: &ExtractContext<'_>,
) -> Result<String> {
    let output = CommandSpec::new("unzip")
        .arg("-p")
        .arg(path)
        .args(parts.iter().copied())
        .run_lenient(ctx.deadline, ctx.cancel)
        .await
        .context("unzip invocation failed")?;
    Ok(output.stdout_text())
}

pub async fn extract_word(path: &Path, ctx: &ExtractContext<'_>) -> Result<Extraction> {
    let text = if is_zip_package(path).await {
        let xml = read_zip_parts(path, &["word/document.xml", "content.xml"], ctx).await?;
        xml_to_text(&xml)
    } else {
        let output = CommandSpec::new("catdoc")
            .arg("-w")
            .arg(path)
            .run(ctx.deadline, ctx.cancel)
            .await
            .context("catdoc failed")?;
        normalize_text(&output.stdout_text())
    };
    Ok(Extraction::text_only(text))
}

pub async fn extract_excel(path: &Path, ctx: &ExtractContext<'_>) -> Result<Extraction> {
    let text = if is_zip_package(path).await {
        let xml = read_zip_parts(
            path,
            &["xl/sharedStrings.xml", "xl/worksheets/sheet*.xml"],
            ctx,
        )
        .await?;
        xml_to_text(&xml)
    } else {
        let output = CommandSpec::new("xls2csv")
            .arg(path)
            .run(ctx.deadline, ctx.cancel)
            .await
            .context("xls2csv failed")?;
        normalize_text(&output.stdout_text())
    };
    Ok(Extraction::text_only(text))
}

pub async fn extract_powerpoint(path: &Path, ctx: &ExtractContext<'_>) -> Result<Extraction> {
    let text = if is_zip_package(path).await {
        let xml = read_zip_parts(path, &["ppt/slides/slide*.xml", "ppt/notesSlides/*.xml"], ctx)
            .await?;
        xml_to_text(&xml)
    } else {
        let output = CommandSpec::new("catppt")
            .arg(path)
            .run(ctx.deadline, ctx.cancel)
            .await
            .context("catppt failed")?;
        normalize_text(&output.stdout_text())
    };
    Ok(Extraction::text_only(text))
}

/// Visio and OpenDocument packages keep their body in `content.xml`
/// (ODF) or per-page XML (vsdx). Legacy OLE Visio degrades to a strings
/// dump.
pub async fn extract_visio(path: &Path, ctx: &ExtractContext<'_>) -> Result<Extraction> {
    let text = if is_zip_package(path).await {
        let xml = read_zip_parts(path, &["content.xml", "visio/pages/page*.xml"], ctx).await?;
        xml_to_text(&xml)
    } else {
        let output = CommandSpec::new("strings")
            .arg("-n")
            .arg("6")
            .arg(path)
            .run(ctx.deadline, ctx.cancel)
            .await
            .context("strings failed")?;
        normalize_text(&output.stdout_text())
    };
    Ok(Extraction::text_only(text))
}

/// Media part patterns across OOXML and ODF package layouts.
const MEDIA_PARTS: &[&str] = &[
    "word/media/*",
    "xl/media/*",
    "ppt/media/*",
    "visio/media/*",
    "media/*",
    "Pictures/*",
];

/// Probe whether a packaged document embeds media without unpacking it.
pub async fn has_media(path: &Path, ctx: &ExtractContext<'_>) -> Result<bool> {
    if !is_zip_package(path).await {
        return Ok(false);
    }
    let output = CommandSpec::new("unzip")
        .arg("-l")
        .arg(path)
        .run_lenient(ctx.deadline, ctx.cancel)
        .await
        .context("unzip listing failed")?;
    let listing = output.stdout_text();
    Ok(listing.contains("/media/") || listing.contains("Pictures/"))
}

/// Unpack embedded images into scratch. Returns whether anything landed.
pub async fn extract_media(
    path: &Path,
    scratch: &ScratchDir,
    ctx: &ExtractContext<'_>,
) -> Result<bool> {
    if !has_media(path, ctx).await? {
        return Ok(false);
    }
    // -j flattens package paths so nested names stay simple; unzip exits
    // non-zero for patterns with no match, which is not a failure here.
    CommandSpec::new("unzip")
        .arg("-o")
        .arg("-j")
        .arg(path)
        .args(MEDIA_PARTS.iter().copied())
        .arg("-d")
        .arg(scratch.path())
        .run_lenient(ctx.deadline, ctx.cancel)
        .await
        .context("unzip media extraction failed")?;
    Ok(!scratch.is_empty())
}
