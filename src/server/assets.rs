//! Static asset delivery.

use std::io::SeekFrom;
use std::path::Path;

use axum::body::Body;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;
use tracing::debug;

use crate::config::DEFAULT_DOCUMENT;
use crate::server::{AppState, ServeError, range, sandbox};

/// Content type for a served file, keyed on the lowercase extension.
/// Quake binary asset formats (pak, bsp, mdl, spr) are opaque binary,
/// as is anything unmapped.
fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("html" | "htm") => "text/html",
        Some("js") => "application/javascript",
        Some("css") => "text/css",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("ogg") => "audio/ogg",
        Some("wav") => "audio/wav",
        Some("mp3") => "audio/mpeg",
        _ => "application/octet-stream",
    }
}

/// Serves the file behind `request_path` from the sandbox root, honoring a
/// single `Range: bytes=<start>-[<end>]` interval. Unparseable ranges fall
/// back to the full content. Every request re-stats and re-reads the file;
/// there is no caching layer.
pub async fn serve(
    state: &AppState,
    request_path: &str,
    request_headers: &HeaderMap,
) -> Result<Response, ServeError> {
    let request_path = if request_path == "/" || request_path.is_empty() {
        DEFAULT_DOCUMENT
    } else {
        request_path
    };

    let target = sandbox::resolve(&state.config.client_dir, request_path)?;

    let metadata = tokio::fs::metadata(&target)
        .await
        .map_err(|_| ServeError::NotFound(format!("File not found: {request_path}")))?;
    if !metadata.is_file() {
        return Err(ServeError::NotFound(format!("Not a file: {request_path}")));
    }

    let size = metadata.len();
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(content_type(&target)),
    );
    headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));

    let range = request_headers
        .get(header::RANGE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| range::parse(value, size));

    let mut file = File::open(&target).await?;

    if let Some(range) = range {
        debug!(
            path = request_path,
            start = range.start,
            end = range.end,
            "serving byte range"
        );
        file.seek(SeekFrom::Start(range.start)).await?;
        if let Ok(value) =
            HeaderValue::from_str(&format!("bytes {}-{}/{}", range.start, range.end, size))
        {
            headers.insert(header::CONTENT_RANGE, value);
        }
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(range.len()));
        let stream = ReaderStream::new(file.take(range.len()));
        return Ok((
            StatusCode::PARTIAL_CONTENT,
            headers,
            Body::from_stream(stream),
        )
            .into_response());
    }

    debug!(path = request_path, size, "serving full file");
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(size));
    let stream = ReaderStream::new(file);
    Ok((StatusCode::OK, headers, Body::from_stream(stream)).into_response())
}
