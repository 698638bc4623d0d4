//! Media extraction: image OCR, audio transcription, video sampling.
//!
//! Images yield their metadata plus OCR text in the configured languages.
//! Audio yields metadata plus a transcript unless transcription is disabled.
//! Video yields metadata and expands into scratch: keyframes for OCR
//! re-entry and the audio track for transcription re-entry.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use super::{Extraction, ExtractContext, normalize_text};
use crate::command::CommandSpec;

/// Tag dump via exiftool; tolerant of unknown formats.
async fn metadata_text(path: &Path, ctx: &ExtractContext<'_>) -> Result<String> {
    let output = CommandSpec::new("exiftool")
        .arg("-S")
        .arg("-s")
        .arg(path)
        .run_lenient(ctx.deadline, ctx.cancel)
        .await
        .context("exiftool failed")?;
    Ok(normalize_text(&output.stdout_text()))
}

pub async fn extract_image(path: &Path, ctx: &ExtractContext<'_>) -> Result<Extraction> {
    let mut parts = vec![metadata_text(path, ctx).await.unwrap_or_default()];

    if !ctx.config.ocr_disabled() {
        let output = CommandSpec::new("tesseract")
            .arg(path)
            .arg("stdout")
            .arg("-l")
            .arg(ctx.config.ocr_language_arg())
            .run_lenient(ctx.deadline, ctx.cancel)
            .await
            .context("tesseract failed")?;
        parts.push(normalize_text(&output.stdout_text()));
    }

    if let Some(images_dir) = ctx.config.images_dir() {
        if let Err(e) = save_thumbnail(path, images_dir, ctx).await {
            debug!(path = %path.display(), error = %e, "thumbnail save failed");
        }
    }

    Ok(Extraction::text_only(normalize_text(&parts.join(" "))))
}

/// Resized copy for the operator's review gallery. Best-effort only.
async fn save_thumbnail(
    path: &Path,
    images_dir: &Path,
    ctx: &ExtractContext<'_>,
) -> Result<()> {
    tokio::fs::create_dir_all(images_dir)
        .await
        .context("failed to create images dir")?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let dest = images_dir.join(format!("{}-{name}.jpg", chrono::Utc::now().timestamp_micros()));
    CommandSpec::new("convert")
        .arg(path)
        .arg("-resize")
        .arg("320x320>")
        .arg(dest)
        .run(ctx.deadline, ctx.cancel)
        .await
        .context("convert failed")?;
    Ok(())
}

pub async fn extract_audio(path: &Path, ctx: &ExtractContext<'_>) -> Result<Extraction> {
    let mut parts = vec![metadata_text(path, ctx).await.unwrap_or_default()];

    if !ctx.config.audio_disabled() {
        // whisper writes <stem>.txt into the output dir; scratch keeps the
        // intermediate out of the way and cleans it up with the file.
        let scratch = ctx.scratch.allocate()?;
        let run = CommandSpec::new("whisper")
            .arg(path)
            .arg("--output_format")
            .arg("txt")
            .arg("--output_dir")
            .arg(scratch.path())
            .run_lenient(ctx.deadline, ctx.cancel)
            .await
            .context("whisper failed")?;
        if run.status == 0 {
            for entry in scratch.entries()? {
                if crate::mapper::extension_of(&entry) == "txt" {
                    let transcript = tokio::fs::read_to_string(&entry).await.unwrap_or_default();
                    parts.push(normalize_text(&transcript));
                }
            }
        }
    }

    Ok(Extraction::text_only(normalize_text(&parts.join(" "))))
}

pub async fn extract_video(path: &Path, ctx: &ExtractContext<'_>) -> Result<Extraction> {
    let text = metadata_text(path, ctx).await.unwrap_or_default();

    let scratch = ctx.scratch.allocate()?;

    if !ctx.config.ocr_disabled() {
        // Keyframes only; full-rate sampling would flood the OCR cap.
        if let Err(e) = CommandSpec::new("ffmpeg")
            .arg("-nostdin")
            .arg("-i")
            .arg(path)
            .arg("-vf")
            .arg("select='eq(pict_type\\,I)'")
            .arg("-vsync")
            .arg("vfr")
            .arg(scratch.path().join("frame%04d.jpg"))
            .run(ctx.deadline, ctx.cancel)
            .await
        {
            debug!(path = %path.display(), error = %e, "keyframe sampling failed");
        }
    }

    if !ctx.config.audio_disabled() {
        if let Err(e) = CommandSpec::new("ffmpeg")
            .arg("-nostdin")
            .arg("-i")
            .arg(path)
            .arg("-vn")
            .arg(scratch.path().join("audio.wav"))
            .run(ctx.deadline, ctx.cancel)
            .await
        {
            debug!(path = %path.display(), error = %e, "audio track extraction failed");
        }
    }

    Ok(Extraction {
        text,
        scratch: if scratch.is_empty() {
            None
        } else {
            Some(scratch)
        },
    })
}
