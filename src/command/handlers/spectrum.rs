//! Full spectrum save handler (`_save_spectrum`)

use super::HandlerContext;
use crate::command::CommandResult;
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tracing::info;

async fn save_spectrum(ctx: &HandlerContext<'_>, path: &Path) -> Result<String> {
    info!("getting spectra...");
    let spectrum = ctx
        .instrument()
        .spectrum()
        .await
        .context("some error during getting spectra")?;

    info!("saving spectra...");
    tokio::fs::write(path, spectrum.to_tsv())
        .await
        .with_context(|| format!("cannot write {}", path.display()))?;

    Ok(format!(
        "Spectrum saved to {} ({} points, {} channels)",
        path.display(),
        spectrum.wavelengths.len(),
        spectrum.data.len()
    ))
}

/// File name used when `_save_spectrum` gets no argument
fn default_spectrum_path(now: DateTime<Local>) -> PathBuf {
    PathBuf::from(now.format("spectrum_%Y%m%d%H%M%S.txt").to_string())
}

/// Handle `_save_spectrum [file]`
pub async fn handle_save_spectrum(ctx: &HandlerContext<'_>) -> CommandResult {
    let path = match ctx.param() {
        Some(name) => PathBuf::from(name),
        None => default_spectrum_path(Local::now()),
    };

    match save_spectrum(ctx, &path).await {
        Ok(message) => CommandResult::Completed {
            message,
            inject: Vec::new(),
        },
        Err(e) => CommandResult::Failed {
            message: format!("{:#}", e),
        },
    }
}
