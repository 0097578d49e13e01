//! API utility functions
//!
//! Pure helpers for building download responses and loading the index page.

use axum::http::HeaderValue;
use bytes::Bytes;
use std::path::Path;
use tracing::{error, info};

use crate::api::error::ApiError;

/// File name of the landing page inside the templates directory
pub const INDEX_PAGE: &str = "index.html";

/// Builds an `attachment` disposition carrying both the ASCII `filename` and
/// the RFC 5987 `filename*` parameter, each percent-encoded as UTF-8.
pub fn content_disposition(display_name: &str) -> Result<HeaderValue, ApiError> {
    let quoted = urlencoding::encode(display_name);
    let value = format!("attachment; filename=\"{quoted}\"; filename*=UTF-8''{quoted}");

    HeaderValue::from_str(&value)
        .map_err(|e| ApiError::Internal(format!("invalid Content-Disposition value: {e}")))
}

/// Reads the landing page once at startup. `None` means `GET /` answers
/// with a configuration error.
pub fn load_index_page(templates_dir: &Path) -> Option<Bytes> {
    let path = templates_dir.join(INDEX_PAGE);
    match std::fs::read_to_string(&path) {
        Ok(html) => {
            info!(path = %path.display(), "Loaded index page");
            Some(Bytes::from(html))
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "Failed to load index page");
            None
        }
    }
}
