//! HTTP surface: router, shared state and response layers.

mod assets;
mod range;
mod sandbox;

use std::sync::Arc;

use axum::extract::Request;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, Uri, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Extension, Router};
use thiserror::Error;
use tokio::sync::Mutex;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tracing::error;

use crate::config::ServerConfig;
use crate::installer::{self, InstallOutcome};

/// Immutable state shared by every handler.
pub struct AppState {
    pub config: ServerConfig,
    /// Serializes install runs; a racing second call waits here and then
    /// observes the already-present short circuit.
    install_lock: Mutex<()>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            install_lock: Mutex::new(()),
        }
    }
}

/// Errors the asset server maps onto HTTP statuses.
#[derive(Debug, Error)]
pub enum ServeError {
    /// The resolved path escaped the sandbox root.
    #[error("Forbidden")]
    PathEscape,
    #[error("{0}")]
    NotFound(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for ServeError {
    fn into_response(self) -> Response {
        match self {
            ServeError::PathEscape => (StatusCode::FORBIDDEN, "Forbidden").into_response(),
            ServeError::NotFound(message) => (StatusCode::NOT_FOUND, message).into_response(),
            ServeError::Io(err) => {
                error!("asset read failed: {err}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

/// Builds the application router: the install endpoint plus a fallback
/// that serves everything else out of the sandbox root.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/download-quake", post(download_quake).options(preflight))
        .fallback(static_handler)
        .layer(Extension(state))
        .layer(CatchPanicLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(middleware::from_fn(no_cache_headers))
}

/// Marks every response as uncacheable so asset edits show up on the next
/// request during development.
async fn no_cache_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-store, must-revalidate"),
    );
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
    response
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// Fallback for every non-API path: OPTIONS answers the CORS contract,
/// everything else goes to the asset server.
async fn static_handler(
    Extension(state): Extension<Arc<AppState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Response, ServeError> {
    if method == Method::OPTIONS {
        return Ok(StatusCode::OK.into_response());
    }
    assets::serve(&state, uri.path(), &headers).await
}

/// `POST /api/download-quake`: runs the install sequence and reports the
/// tri-state outcome. 200 and 409 both mean "assets ready" to the client.
async fn download_quake(Extension(state): Extension<Arc<AppState>>) -> Response {
    let _guard = state.install_lock.lock().await;
    match installer::install_assets(&state.config).await {
        Ok(InstallOutcome::AlreadyPresent) => {
            (StatusCode::CONFLICT, "Quake data already exists").into_response()
        }
        Ok(InstallOutcome::Installed) => {
            (StatusCode::OK, "Download and extraction complete").into_response()
        }
        Err(err) => {
            error!("install failed: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to download Quake data: {err}"),
            )
                .into_response()
        }
    }
}
