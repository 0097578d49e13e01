use std::collections::HashMap;

use axum::{
    Json,
    body::Body,
    extract::{Query, State, rejection::QueryRejection},
    http::{HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use tracing::{info, warn};

use super::{
    models::{DownloadQuery, HealthResponse},
    state::AppState,
    utils::content_disposition,
    validation::validate_video_url,
};
use crate::api::error::ApiError;
use crate::streaming::AssetStream;

/// Media type of every successful download
pub const AUDIO_CONTENT_TYPE: &str = "audio/m4a";

/// Landing page (GET /)
pub async fn index(State(state): State<AppState>) -> Result<Html<Body>, ApiError> {
    let page = state.index_page.clone().ok_or(ApiError::TemplateUnavailable)?;
    Ok(Html(Body::from(page)))
}

/// Audio download endpoint (GET /api/download)
///
/// ## Flow:
/// 1. Parse the query and validate the URL shape; rejects never reach the
///    retriever
/// 2. Extract metadata and download through the fetcher, which classifies
///    failures and cleans up after itself
/// 3. Stream the validated file back with attachment headers; the file is
///    deleted once the body finishes or the client goes away
pub async fn download(
    State(state): State<AppState>,
    query: Result<Query<DownloadQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::BadInput(e.body_text()))?;

    if let Err(e) = validate_video_url(&query.url) {
        warn!(url = %query.url, error = %e, "Rejected download request");
        return Err(ApiError::BadInput(e.to_string()));
    }

    info!(url = %query.url, embed_thumbnail = query.embed_thumbnail, "Download requested");
    let asset = state
        .fetcher
        .fetch_audio(&query.url, query.embed_thumbnail)
        .await?;

    let disposition = content_disposition(asset.display_name())?;
    let size = asset.size_bytes();

    let stream = AssetStream::open(asset, state.chunk_size())
        .await
        .map_err(|e| ApiError::Internal(format!("failed to open downloaded file: {e}")))?
        .with_metrics(state.metrics.clone());

    let headers = [
        (header::CONTENT_DISPOSITION, disposition),
        (header::CONTENT_TYPE, HeaderValue::from_static(AUDIO_CONTENT_TYPE)),
        (header::CONTENT_LENGTH, HeaderValue::from(size)),
    ];

    Ok((StatusCode::OK, headers, Body::from_stream(stream)).into_response())
}

/// Liveness plus counters (GET /health)
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let mut components = HashMap::new();
    components.insert("api".to_string(), "healthy".to_string());
    let templates = if state.index_page.is_some() {
        "healthy"
    } else {
        "unavailable"
    };
    components.insert("templates".to_string(), templates.to_string());

    // Downloads keep working without the landing page, so only the API
    // component decides the overall status.
    let response = HealthResponse {
        status: "healthy".to_string(),
        components,
        version: env!("CARGO_PKG_VERSION").to_string(),
        metrics: state.metrics.snapshot(),
    };

    (StatusCode::OK, Json(response))
}
