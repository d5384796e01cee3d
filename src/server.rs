//! HTTP boundary: application state, router and handlers.
//!
//! The router is built from an explicit [`AppState`] so the same routes can be served by the
//! binary or driven directly in tests.  Handlers decode the JSON body themselves to turn decode
//! failures into [`ReportError::MalformedRequest`], answered with the same JSON error body as
//! every other failure rather than axum's plain-text rejections.

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{error, warn};
use serde::Serialize;
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::error::ReportError;
use crate::model::ReportRequest;
use crate::report::{ReportBuilder, ReportDocument};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Stateless report builder shared by every request.
    pub builder: ReportBuilder,
    /// Largest accepted request body in bytes.
    pub body_limit_bytes: usize,
}

impl AppState {
    /// Creates state around the given builder with the default 1 MiB body limit.
    pub fn new(builder: ReportBuilder) -> Self {
        Self {
            builder,
            body_limit_bytes: 1024 * 1024,
        }
    }

    /// Sets the body limit and returns the updated state.
    pub fn with_body_limit(mut self, bytes: usize) -> Self {
        self.body_limit_bytes = bytes;
        self
    }
}

/// Creates the application router.
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.body_limit_bytes;

    Router::new()
        .route("/health", get(health_check))
        .route("/generate_pdf", post(generate_pdf))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds `address` and serves the router until the process receives Ctrl+C.
pub async fn serve(address: &str, state: AppState) -> std::io::Result<()> {
    let listener = TcpListener::bind(address).await?;
    log::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {err}");
    }
}

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: &'static str,
    /// Service version.
    pub version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn generate_pdf(State(state): State<AppState>, body: Bytes) -> Response {
    match render_request(state.builder, body).await {
        Ok(document) => document.into_response(),
        Err(err) => err.into_response(),
    }
}

async fn render_request(builder: ReportBuilder, body: Bytes) -> Result<ReportDocument, ReportError> {
    let request = ReportRequest::from_json(&body)
        .map_err(|err| ReportError::MalformedRequest(format!("Invalid report request: {err}")))?;

    tokio::task::spawn_blocking(move || builder.build(&request))
        .await
        .map_err(|err| ReportError::Internal(format!("Report rendering task failed: {err}")))?
}

/// Reduces a file name to characters that are safe inside a quoted header parameter.
fn header_safe_file_name(file_name: &str) -> String {
    file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

impl IntoResponse for ReportDocument {
    fn into_response(self) -> Response {
        let disposition = format!(
            "attachment; filename=\"{}\"",
            header_safe_file_name(&self.file_name)
        );
        let media_type = self.media_type();

        match HeaderValue::from_str(&disposition) {
            Ok(disposition) => (
                [
                    (header::CONTENT_TYPE, HeaderValue::from_static(media_type)),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                self.bytes,
            )
                .into_response(),
            Err(err) => {
                ReportError::Internal(format!("Invalid download file name: {err}")).into_response()
            }
        }
    }
}

impl IntoResponse for ReportError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if self.is_client_error() {
            warn!("Rejected report request: {self}");
        } else {
            error!("Report generation failed: {self}");
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
