//! Request and response shapes for the HTTP surface.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::observability::MetricsSnapshot;

/// Query string of `GET /api/download`
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadQuery {
    pub url: String,
    #[serde(default)]
    pub embed_thumbnail: bool,
}

/// Body of every JSON error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub detail: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub components: HashMap<String, String>,
    pub version: String,
    pub metrics: MetricsSnapshot,
}
