//! Format-specific text extraction.
//!
//! Adapters wrap external tools behind one contract: given a file, produce
//! plain text and, for container-like formats, a scratch directory of nested
//! files for the engine to re-process. Adapters are pure with respect to the
//! engine: they spawn processes and write into their scratch dir, nothing
//! else. All external invocations go through the typed command runner and
//! inherit the deadline the engine derived from the registry's timeout
//! category.

pub mod archive;
pub mod html;
pub mod mail;
pub mod media;
pub mod office;
pub mod opaque;
pub mod pdf;
pub mod text;
pub mod windows;

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::classify::{DocClass, Expansion};
use crate::config::CrawlConfig;
use crate::scratch::{ScratchDir, ScratchManager};

/// What an adapter produced for one file.
#[derive(Debug, Default)]
pub struct Extraction {
    /// Plain text, stripped of NULs and newlines by the adapter.
    pub text: String,
    /// Populated when the file expanded into nested files.
    pub scratch: Option<ScratchDir>,
}

impl Extraction {
    #[must_use]
    pub fn text_only(text: String) -> Self {
        Self {
            text,
            scratch: None,
        }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Shared adapter inputs, threaded explicitly from the engine.
pub struct ExtractContext<'a> {
    pub config: &'a CrawlConfig,
    pub scratch: &'a ScratchManager,
    pub cancel: &'a CancellationToken,
    /// Deadline for each external invocation, derived from the registry's
    /// timeout category. Adapters never see the configured value itself.
    pub deadline: Duration,
}

/// Run the adapter for `class` against `path`.
///
/// The sparse-text rule lives here: classes flagged `SparseMedia` get a
/// second, media-extracting pass when the primary text came back shorter
/// than the configured threshold, so scanned office documents and PDFs
/// re-enter the pipeline as images for OCR.
pub async fn extract(
    class: DocClass,
    expansion: Expansion,
    path: &Path,
    ctx: &ExtractContext<'_>,
) -> Result<Extraction> {
    let mut extraction = run_primary(class, path, ctx).await?;

    if expansion == Expansion::SparseMedia
        && !ctx.config.ocr_disabled()
        && extraction.text.chars().count() < ctx.config.ocr_min_text()
    {
        debug!(
            path = %path.display(),
            class = %class,
            text_chars = extraction.text.chars().count(),
            "primary text sparse, extracting embedded media"
        );
        let scratch = ctx.scratch.allocate()?;
        let populated = match class {
            DocClass::Pdf => pdf::extract_images(path, &scratch, ctx).await?,
            DocClass::Word | DocClass::Excel | DocClass::Powerpoint | DocClass::Visio => {
                office::extract_media(path, &scratch, ctx).await?
            }
            _ => false,
        };
        if populated {
            extraction.scratch = Some(scratch);
        }
    }

    Ok(extraction)
}

async fn run_primary(
    class: DocClass,
    path: &Path,
    ctx: &ExtractContext<'_>,
) -> Result<Extraction> {
    match class {
        DocClass::Html => html::extract(path).await,
        DocClass::Text => text::extract(path).await,
        DocClass::Word => office::extract_word(path, ctx).await,
        DocClass::Excel => office::extract_excel(path, ctx).await,
        DocClass::Powerpoint => office::extract_powerpoint(path, ctx).await,
        DocClass::Visio => office::extract_visio(path, ctx).await,
        DocClass::Pdf => pdf::extract(path, ctx).await,
        DocClass::Lnk => windows::extract_lnk(path, ctx).await,
        DocClass::Executable => windows::extract_strings(path, ctx).await,
        DocClass::Thumbsdb => windows::extract_thumbs(path, ctx).await,
        DocClass::Winevent => windows::extract_evtx(path, ctx).await,
        DocClass::Message => mail::extract(path, ctx).await,
        DocClass::Archive => archive::extract(path, ctx).await,
        DocClass::Package => archive::extract_package(path, ctx).await,
        DocClass::Image => media::extract_image(path, ctx).await,
        DocClass::Audio => media::extract_audio(path, ctx).await,
        DocClass::Video => media::extract_video(path, ctx).await,
        DocClass::Sqlite => opaque::extract_sqlite(path, ctx).await,
        DocClass::Pcap => opaque::extract_pcap(path, ctx).await,
        DocClass::Bytecode => opaque::extract_bytecode(path, ctx).await,
        DocClass::Raw => Ok(Extraction::empty()),
        DocClass::Unknown => opaque::extract_unknown(path).await,
    }
}

/// Normalize tool output into record-ready text: drop NULs, fold all other
/// control characters to spaces, collapse runs of whitespace.
#[must_use]
pub fn normalize_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut last_space = true;
    for c in raw.chars() {
        if c == '\0' {
            continue;
        }
        if c.is_whitespace() || c.is_control() {
            if !last_space {
                out.push(' ');
                last_space = true;
            }
        } else {
            out.push(c);
            last_space = false;
        }
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out
}
