//! HTTP surface: `POST /process-video`, `GET /download`, `GET /health`.

mod cors;
mod error;

pub use cors::{InvalidOrigin, build_cors_layer};
pub use error::ApiError;

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, instrument};

use crate::model::VideoMetadata;
use crate::resolver::ResolverRegistry;
use crate::stream::Streamer;

/// Best-known size of the download in bytes; empty when unknown.
pub const X_ESTIMATED_FILESIZE: HeaderName = HeaderName::from_static("x-estimated-filesize");

/// Percent-encoded `"{title}.{ext}"`.
pub const X_ORIGINAL_FILENAME: HeaderName = HeaderName::from_static("x-original-filename");

/// Shared, read-only handler state.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ResolverRegistry>,
    pub streamer: Streamer,
}

impl AppState {
    #[must_use]
    pub fn new(registry: Arc<ResolverRegistry>, streamer: Streamer) -> Self {
        Self { registry, streamer }
    }
}

/// `POST /process-video` body.
#[derive(Debug, Deserialize)]
pub struct ProcessVideoRequest {
    pub url: String,
}

/// `GET /download` query.
#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub url: String,
    pub format_id: String,
}

/// Builds the application router with tracing and the given CORS policy.
pub fn router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/process-video", post(process_video))
        .route("/download", get(download))
        .route("/health", get(health))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

#[instrument(skip(state, request), fields(url = %request.url))]
async fn process_video(
    State(state): State<AppState>,
    Json(request): Json<ProcessVideoRequest>,
) -> Result<Json<VideoMetadata>, ApiError> {
    let url = require_url(&request.url)?;
    let metadata = state.registry.resolve(url).await?;
    Ok(Json(metadata))
}

#[instrument(skip(state, query), fields(url = %query.url, format_id = %query.format_id))]
async fn download(
    State(state): State<AppState>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, ApiError> {
    let url = require_url(&query.url)?;
    let format_id = query.format_id.trim();
    if format_id.is_empty() {
        return Err(ApiError::bad_request(
            "invalid_format_selected",
            "format_id must not be empty",
        ));
    }

    let media = state.streamer.open(url, format_id).await?;

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(media.content_type));
    headers.insert(CONTENT_DISPOSITION, header_value(&media.content_disposition())?);
    headers.insert(
        X_ESTIMATED_FILESIZE,
        header_value(&media.estimated_size_header())?,
    );
    headers.insert(X_ORIGINAL_FILENAME, header_value(&media.encoded_filename())?);
    debug!(?headers, "Download headers committed");

    Ok((headers, Body::from_stream(media.body)).into_response())
}

fn require_url(url: &str) -> Result<&str, ApiError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(ApiError::bad_request("invalid_url", "url must not be empty"));
    }
    Ok(url)
}

fn header_value(value: &str) -> Result<HeaderValue, ApiError> {
    HeaderValue::from_str(value)
        .map_err(|e| ApiError::internal(format!("could not build response header: {e}")))
}
