//! Server configuration.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

/// Name of the game data subdirectory inside the client directory. The
/// remote archive uses the same name for its top-level folder.
pub const ASSETS_DIR_NAME: &str = "id1";

/// Document served when the root path is requested.
pub const DEFAULT_DOCUMENT: &str = "index.htm";

/// File name of the scratch archive written during a fetch.
const SCRATCH_ARCHIVE_NAME: &str = "id1.zip";

const DEFAULT_ARCHIVE_URL: &str =
    "https://dl.dropboxusercontent.com/scl/fi/hyxcaqpfwhnkz1whvrn0y/id1.zip?rlkey=ni002yllmovegdfp3tmqsv6eh&st=3kylmm6z&dl=0";

/// Configuration built once at startup and shared by the asset server and
/// the installer.
#[derive(Parser, Debug, Clone)]
#[command(name = "webquake-server", version, about = "WebQuake asset server")]
pub struct ServerConfig {
    /// Bind address for the HTTP listener.
    #[arg(long, env = "WEBQUAKE_BIND", default_value = "0.0.0.0")]
    pub host: String,

    /// Port for the HTTP listener.
    #[arg(short, long, env = "WEBQUAKE_PORT", default_value_t = 5000)]
    pub port: u16,

    /// Directory holding the WebQuake client; also the sandbox root for
    /// every file served or written.
    #[arg(long, env = "WEBQUAKE_CLIENT_DIR", default_value = "Client")]
    pub client_dir: PathBuf,

    /// URL of the game data archive fetched by the install endpoint.
    #[arg(long, env = "WEBQUAKE_ARCHIVE_URL", default_value = DEFAULT_ARCHIVE_URL)]
    pub archive_url: String,

    /// Directory for the scratch archive during a fetch. Defaults to the
    /// OS temp directory; must live outside the client directory.
    #[arg(long, env = "WEBQUAKE_SCRATCH_DIR")]
    pub scratch_dir: Option<PathBuf>,

    /// Upper bound on the whole archive fetch, in seconds.
    #[arg(long, env = "WEBQUAKE_FETCH_TIMEOUT_SECS", default_value_t = 60)]
    pub fetch_timeout_secs: u64,
}

impl ServerConfig {
    /// Creates the client directory if needed and pins `client_dir` to its
    /// canonical absolute form. Called once before the listener starts;
    /// the sandbox root never changes afterwards.
    pub async fn canonicalize_root(&mut self) -> Result<()> {
        tokio::fs::create_dir_all(&self.client_dir)
            .await
            .with_context(|| format!("creating client directory {:?}", self.client_dir))?;
        self.client_dir = tokio::fs::canonicalize(&self.client_dir)
            .await
            .with_context(|| format!("resolving client directory {:?}", self.client_dir))?;
        Ok(())
    }

    /// Directory the archive is extracted into.
    pub fn assets_dir(&self) -> PathBuf {
        self.client_dir.join(ASSETS_DIR_NAME)
    }

    /// Where the fetched archive lands before extraction.
    pub fn scratch_path(&self) -> PathBuf {
        self.scratch_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
            .join(SCRATCH_ARCHIVE_NAME)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

#[cfg(test)]
pub(crate) fn test_config(client_dir: PathBuf, scratch_dir: PathBuf) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".into(),
        port: 0,
        client_dir,
        archive_url: "http://127.0.0.1:9/unused".into(),
        scratch_dir: Some(scratch_dir),
        fetch_timeout_secs: 5,
    }
}
