//! Mail message extraction.
//!
//! RFC822/eml messages yield their header summary and body text; attachments
//! are unpacked into scratch and re-enter the pipeline. Outlook `.msg` blobs
//! are first normalized to eml with `msgconvert`, written into scratch so
//! the converted message is itself processed as a nested file.

use std::path::Path;

use anyhow::{Context, Result};

use super::text::decode_bytes;
use super::{Extraction, ExtractContext, normalize_text};
use crate::command::CommandSpec;
use crate::mapper::extension_of;

/// Headers worth keeping in the record text.
const KEPT_HEADERS: &[&str] = &["from:", "to:", "cc:", "subject:", "date:"];

/// Pull the interesting headers and the first text body out of a raw
/// message. MIME part boundaries and base64 payloads stay behind; the
/// attachment unpacker handles those.
fn message_text(raw: &str) -> String {
    let mut kept = Vec::new();
    let mut body = String::new();
    let mut in_body = false;

    for line in raw.lines() {
        if in_body {
            // Base64 payload lines carry no words an auditor can search.
            if line.len() > 100 && !line.contains(' ') {
                continue;
            }
            body.push_str(line);
            body.push(' ');
        } else if line.is_empty() {
            in_body = true;
        } else {
            let lower = line.to_ascii_lowercase();
            if KEPT_HEADERS.iter().any(|h| lower.starts_with(h)) {
                kept.push(line.to_string());
            }
        }
    }

    normalize_text(&format!("{} {}", kept.join(" "), body))
}

pub async fn extract(path: &Path, ctx: &ExtractContext<'_>) -> Result<Extraction> {
    if extension_of(path) == "msg" {
        return extract_msg(path, ctx).await;
    }

    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let text = message_text(&decode_bytes(&bytes));

    // Attachments become nested files.
    let scratch = ctx.scratch.allocate()?;
    CommandSpec::new("ripmime")
        .arg("-i")
        .arg(path)
        .arg("-d")
        .arg(scratch.path())
        .arg("--no-nameless")
        .run_lenient(ctx.deadline, ctx.cancel)
        .await
        .context("ripmime failed")?;

    Ok(Extraction {
        text,
        scratch: if scratch.is_empty() {
            None
        } else {
            Some(scratch)
        },
    })
}

/// Outlook `.msg`: convert to eml inside scratch; the converted message is
/// re-processed by this adapter on the nested pass.
async fn extract_msg(path: &Path, ctx: &ExtractContext<'_>) -> Result<Extraction> {
    let scratch = ctx.scratch.allocate()?;
    CommandSpec::new("msgconvert")
        .arg("--outfile")
        .arg(scratch.path().join("message.eml"))
        .arg(path)
        .run_lenient(ctx.deadline, ctx.cancel)
        .await
        .context("msgconvert failed")?;

    Ok(Extraction {
        text: String::new(),
        scratch: if scratch.is_empty() {
            None
        } else {
            Some(scratch)
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_headers_and_body_drops_base64() {
        let raw = "From: alice@corp\nTo: bob@corp\nSubject: Q1 numbers\nX-Mailer: x\n\
                   \nPlease see attached.\n\
                   VGhpc2lzYWxvbmdiYXNlNjRsaW5ld2l0aG5vc3BhY2VzYXRhbGxwYWRkZWRvdXR0b292ZXJvbmVodW5kcmVkY2hhcmFjdGVyc2xvbmc=\n";
        let text = message_text(raw);
        assert!(text.contains("From: alice@corp"));
        assert!(text.contains("Subject: Q1 numbers"));
        assert!(text.contains("Please see attached."));
        assert!(!text.contains("X-Mailer"));
        assert!(!text.contains("VGhpc2lz"));
    }
}
