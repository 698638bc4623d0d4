//! External MIME detection.
//!
//! Primary: `file --brief --mime-type`, invoked through the typed command
//! runner. Fallback: extension-based guessing, then `application/octet-stream`.
//! Probe failures are classification degradations, never file failures.

use std::path::Path;

use tracing::debug;

use crate::command::{CommandSpec, run_probe};

/// Detect the MIME type of a file.
///
/// Never errors: a failed probe degrades to extension guessing and finally
/// to `application/octet-stream`, which the registry maps to `raw`.
pub async fn detect_mime(path: &Path) -> String {
    match run_probe(
        CommandSpec::new("file")
            .arg("--brief")
            .arg("--mime-type")
            .arg(path),
    )
    .await
    {
        Ok(output) if output.status == 0 => {
            let mime = output.stdout_text().trim().to_string();
            if !mime.is_empty() {
                return mime;
            }
        }
        Ok(output) => {
            debug!(path = %path.display(), status = output.status, "file probe exited non-zero");
        }
        Err(e) => {
            debug!(path = %path.display(), error = %e, "file probe unavailable");
        }
    }

    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or("application/octet-stream")
        .to_string()
}

/// Probe whether an unclassified file is textual.
///
/// Asks the file-type tool for a description first; when the tool is
/// unavailable, sniffs the head of the file for NUL bytes.
pub async fn is_textual(path: &Path) -> bool {
    if let Ok(output) = run_probe(CommandSpec::new("file").arg("--brief").arg(path)).await
        && output.status == 0
    {
        return output.stdout_text().to_ascii_lowercase().contains("text");
    }

    match tokio::fs::read(path).await {
        Ok(bytes) => {
            let head = &bytes[..bytes.len().min(4096)];
            !head.is_empty() && !head.contains(&0u8)
        }
        Err(_) => false,
    }
}
