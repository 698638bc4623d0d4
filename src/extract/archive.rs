//! Container extraction.
//!
//! An archive's record carries its listing as content; its payload is
//! unpacked into scratch and re-enters the pipeline as nested files. Format
//! routing keys off the extension first and falls back to 7z, which opens
//! most of what turns up on shares (7z, msi, cab, rpm, jar and friends).

use std::path::Path;

use anyhow::{Context, Result};

use super::{Extraction, ExtractContext, normalize_text};
use crate::command::CommandSpec;
use crate::mapper::extension_of;
use crate::scratch::ScratchDir;

enum Tool {
    Zip,
    Rar,
    Tar,
    SevenZ,
}

fn tool_for(path: &Path) -> Tool {
    match extension_of(path).as_str() {
        "zip" | "jar" | "war" | "ear" => Tool::Zip,
        "rar" => Tool::Rar,
        "tar" | "gz" | "tgz" | "bz2" | "tbz2" | "xz" | "txz" => Tool::Tar,
        _ => Tool::SevenZ,
    }
}

async fn listing(path: &Path, ctx: &ExtractContext<'_>) -> Result<String> {
    let spec = match tool_for(path) {
        Tool::Zip => CommandSpec::new("unzip").arg("-l").arg(path),
        Tool::Rar => CommandSpec::new("unrar").arg("l").arg(path),
        Tool::Tar => CommandSpec::new("tar").arg("tf").arg(path),
        Tool::SevenZ => CommandSpec::new("7z").arg("l").arg(path),
    };
    let output = spec
        .run_lenient(ctx.deadline, ctx.cancel)
        .await
        .context("archive listing failed")?;
    Ok(normalize_text(&output.stdout_text()))
}

async fn unpack(path: &Path, scratch: &ScratchDir, ctx: &ExtractContext<'_>) -> Result<()> {
    let dest = scratch.path();
    let spec = match tool_for(path) {
        Tool::Zip => CommandSpec::new("unzip")
            .arg("-o")
            .arg(path)
            .arg("-d")
            .arg(dest),
        Tool::Rar => CommandSpec::new("unrar")
            .arg("x")
            .arg("-o+")
            .arg(path)
            .arg(dest),
        Tool::Tar => CommandSpec::new("tar")
            .arg("xf")
            .arg(path)
            .arg("-C")
            .arg(dest),
        Tool::SevenZ => CommandSpec::new("7z")
            .arg("x")
            .arg("-y")
            .arg(format!("-o{}", dest.display()))
            .arg(path),
    };
    // Damaged members are common; keep whatever unpacked.
    spec.run_lenient(ctx.deadline, ctx.cancel)
        .await
        .context("archive unpack failed")?;
    Ok(())
}

pub async fn extract(path: &Path, ctx: &ExtractContext<'_>) -> Result<Extraction> {
    let text = listing(path, ctx).await?;
    let scratch = ctx.scratch.allocate()?;
    unpack(path, &scratch, ctx).await?;
    Ok(Extraction {
        text,
        scratch: if scratch.is_empty() {
            None
        } else {
            Some(scratch)
        },
    })
}

/// RPM and DEB packages. DEB goes through `dpkg-deb`, which also prints the
/// control information as the record text; everything else lands on 7z.
pub async fn extract_package(path: &Path, ctx: &ExtractContext<'_>) -> Result<Extraction> {
    let ext = extension_of(path);
    if ext == "deb" {
        let info = CommandSpec::new("dpkg-deb")
            .arg("-I")
            .arg(path)
            .run_lenient(ctx.deadline, ctx.cancel)
            .await
            .context("dpkg-deb info failed")?;
        let scratch = ctx.scratch.allocate()?;
        CommandSpec::new("dpkg-deb")
            .arg("-x")
            .arg(path)
            .arg(scratch.path())
            .run_lenient(ctx.deadline, ctx.cancel)
            .await
            .context("dpkg-deb extract failed")?;
        return Ok(Extraction {
            text: normalize_text(&info.stdout_text()),
            scratch: if scratch.is_empty() {
                None
            } else {
                Some(scratch)
            },
        });
    }

    // rpm and anything else package-shaped: 7z handles the cpio payload.
    let text = listing(path, ctx).await?;
    let scratch = ctx.scratch.allocate()?;
    CommandSpec::new("7z")
        .arg("x")
        .arg("-y")
        .arg(format!("-o{}", scratch.path().display()))
        .arg(path)
        .run_lenient(ctx.deadline, ctx.cancel)
        .await
        .context("7z package unpack failed")?;
    Ok(Extraction {
        text,
        scratch: if scratch.is_empty() {
            None
        } else {
            Some(scratch)
        },
    })
}
