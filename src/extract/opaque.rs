//! Opaque-format extraction: database dumps, capture files, bytecode.

use std::path::Path;

use anyhow::{Context, Result};

use super::{Extraction, ExtractContext, normalize_text};
use crate::classify::is_textual;
use crate::command::CommandSpec;

/// Full SQL dump of an SQLite database.
pub async fn extract_sqlite(path: &Path, ctx: &ExtractContext<'_>) -> Result<Extraction> {
    let output = CommandSpec::new("sqlite3")
        .arg("-readonly")
        .arg(path)
        .arg(".dump")
        .run_lenient(ctx.deadline, ctx.cancel)
        .await
        .context("sqlite3 dump failed")?;
    Ok(Extraction::text_only(normalize_text(&output.stdout_text())))
}

/// Packet capture rendered as tcpdump's one-line-per-packet text.
pub async fn extract_pcap(path: &Path, ctx: &ExtractContext<'_>) -> Result<Extraction> {
    let output = CommandSpec::new("tcpdump")
        .arg("-nn")
        .arg("-r")
        .arg(path)
        .run_lenient(ctx.deadline, ctx.cancel)
        .await
        .context("tcpdump failed")?;
    Ok(Extraction::text_only(normalize_text(&output.stdout_text())))
}

/// Python bytecode disassembly.
pub async fn extract_bytecode(path: &Path, ctx: &ExtractContext<'_>) -> Result<Extraction> {
    let output = CommandSpec::new("python3")
        .arg("-m")
        .arg("dis")
        .arg(path)
        .run_lenient(ctx.deadline, ctx.cancel)
        .await
        .context("python3 -m dis failed")?;
    Ok(Extraction::text_only(normalize_text(&output.stdout_text())))
}

/// Fallback for unmatched MIME types: if the file-type tool says the file is
/// textual, emit its plain content; otherwise emit an empty record.
pub async fn extract_unknown(path: &Path) -> Result<Extraction> {
    if is_textual(path).await {
        super::text::extract(path).await
    } else {
        Ok(Extraction::empty())
    }
}
