//! Plain-text extraction with encoding detection.
//!
//! Audited shares carry text files in whatever code page the source system
//! used; the detector picks the encoding and everything is normalized to
//! UTF-8 before it reaches the index.

use std::path::Path;

use anyhow::{Context, Result};
use chardetng::EncodingDetector;

use super::{Extraction, normalize_text};

/// Cap on how much of a text file is read into a record. Larger files are
/// truncated, which the failure model treats as a successful partial read.
const MAX_TEXT_BYTES: usize = 4 * 1024 * 1024;

/// Decode a byte buffer using a detected encoding.
#[must_use]
pub fn decode_bytes(bytes: &[u8]) -> String {
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let encoding = detector.guess(None, true);
    let (decoded, _, _) = encoding.decode(bytes);
    decoded.into_owned()
}

pub async fn extract(path: &Path) -> Result<Extraction> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let head = if bytes.len() > MAX_TEXT_BYTES {
        &bytes[..MAX_TEXT_BYTES]
    } else {
        &bytes[..]
    };
    Ok(Extraction::text_only(normalize_text(&decode_bytes(head))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_utf8_text() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello,world\n\"quote\"").expect("write");

        let extraction = extract(&path).await.expect("extract");
        assert_eq!(extraction.text, "hello,world \"quote\"");
        assert!(extraction.scratch.is_none());
    }

    #[tokio::test]
    async fn decodes_latin1_content() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("latin.txt");
        // "café" encoded as ISO-8859-1.
        std::fs::write(&path, b"caf\xe9 con leche, por favor").expect("write");

        let extraction = extract(&path).await.expect("extract");
        assert!(extraction.text.contains("café"), "got: {}", extraction.text);
    }
}
