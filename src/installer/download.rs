//! Streaming archive download.

use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::{InstallError, remove_scratch};

/// Fetches `url` into `destination` with a streaming GET bounded by
/// `timeout`. A non-success status or any transport failure removes the
/// partial file before the error is returned.
pub async fn fetch_archive(
    url: &str,
    destination: &Path,
    timeout: Duration,
) -> Result<(), InstallError> {
    let client = Client::builder().timeout(timeout).build()?;

    debug!(url, ?destination, "fetching archive");
    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        return Err(InstallError::Status(response.status()));
    }

    if let Err(err) = write_body(response, destination).await {
        remove_scratch(destination).await;
        return Err(err);
    }
    Ok(())
}

async fn write_body(response: reqwest::Response, destination: &Path) -> Result<(), InstallError> {
    let mut file = File::create(destination).await?;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
    }

    file.flush().await?;
    Ok(())
}
