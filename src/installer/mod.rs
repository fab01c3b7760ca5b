//! Game data installation: fetch the remote archive, unpack it safely,
//! clean up.

mod download;
mod extract;

use std::io::ErrorKind;
use std::path::Path;

use thiserror::Error;
use tokio::fs;
use tracing::{info, warn};

use crate::config::{ASSETS_DIR_NAME, ServerConfig};

/// Result of one install invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The assets subdirectory already holds game data; nothing was done.
    AlreadyPresent,
    /// The archive was fetched and unpacked.
    Installed,
}

/// Reasons an install can fail. Per-entry path-safety violations are not
/// among them: those are logged and skipped during extraction.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("bad archive: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("extraction task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Runs the check / fetch / prepare / extract / cleanup sequence.
///
/// Idempotent at the directory level: once the assets subdirectory is
/// non-empty the call short-circuits without touching the network. A
/// failed run may leave partially extracted files behind; there is no
/// rollback, and re-running is safe either way.
pub async fn install_assets(config: &ServerConfig) -> Result<InstallOutcome, InstallError> {
    let assets_dir = config.assets_dir();
    if dir_has_entries(&assets_dir).await? {
        info!(?assets_dir, "game data already present");
        return Ok(InstallOutcome::AlreadyPresent);
    }

    let scratch = config.scratch_path();
    info!(url = %config.archive_url, "downloading game data");
    download::fetch_archive(&config.archive_url, &scratch, config.fetch_timeout()).await?;

    fs::create_dir_all(&assets_dir).await?;

    info!("download complete, extracting");
    let extracted = extract::extract_archive(
        scratch.clone(),
        assets_dir.clone(),
        ASSETS_DIR_NAME.to_string(),
    )
    .await;

    remove_scratch(&scratch).await;
    extracted?;

    info!(?assets_dir, "game data installed");
    Ok(InstallOutcome::Installed)
}

/// True when the directory exists and contains at least one entry.
async fn dir_has_entries(dir: &Path) -> Result<bool, InstallError> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err.into()),
    };
    Ok(entries.next_entry().await?.is_some())
}

/// Removes the scratch archive. Failure is logged but never changes the
/// install outcome.
pub(crate) async fn remove_scratch(path: &Path) {
    if let Err(err) = fs::remove_file(path).await
        && err.kind() != ErrorKind::NotFound
    {
        warn!(?path, "failed to remove scratch archive: {err}");
    }
}
