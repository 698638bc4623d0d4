//! HTML to plain text.
//!
//! Mirrored sites are mostly markup; the record wants the rendered words.
//! Encoding is detected the same way as plain text, then script and style
//! blocks are dropped, tags removed, and entities resolved.

use std::path::Path;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;

use super::text::decode_bytes;
use super::{Extraction, normalize_text};

static SCRIPT_STYLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)>").expect("static regex")
});
static COMMENTS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").expect("static regex"));
static TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]+>").expect("static regex"));

/// Render HTML bytes to plain text.
#[must_use]
pub fn html_to_text(html: &str) -> String {
    let stripped = SCRIPT_STYLE.replace_all(html, " ");
    let stripped = COMMENTS.replace_all(&stripped, " ");
    let stripped = TAGS.replace_all(&stripped, " ");
    normalize_text(&decode_entities(&stripped))
}

fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

pub async fn extract(path: &Path) -> Result<Extraction> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(Extraction::text_only(html_to_text(&decode_bytes(&bytes))))
}
