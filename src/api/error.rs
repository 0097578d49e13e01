use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use super::models::ErrorResponse;
use crate::retrieval::{ErrorClassification, FetchError};

/// Plain-text body served when the index page could not be loaded at startup
pub const TEMPLATE_UNAVAILABLE_MESSAGE: &str =
    "Server configuration error: Could not load page template.";

#[derive(Debug, Error)]
pub enum ApiError {
    /// Rejected before any retrieval work started
    #[error("{0}")]
    BadInput(String),
    /// Classified failure from the fetcher; the detail is already client-safe
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// The cause is logged, never returned
    #[error("internal error: {0}")]
    Internal(String),
    #[error("page template unavailable")]
    TemplateUnavailable,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Fetch(e) => match e.kind {
                ErrorClassification::NotFound => StatusCode::NOT_FOUND,
                ErrorClassification::BadUrl => StatusCode::BAD_REQUEST,
                ErrorClassification::InsufficientStorage => StatusCode::INSUFFICIENT_STORAGE,
                ErrorClassification::CopyrightBlocked => StatusCode::UNAVAILABLE_FOR_LEGAL_REASONS,
                ErrorClassification::FfmpegRequired
                | ErrorClassification::DownloadFailed
                | ErrorClassification::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Internal(_) | ApiError::TemplateUnavailable => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadInput(_) => "BAD_INPUT",
            ApiError::Fetch(e) => match e.kind {
                ErrorClassification::NotFound => "NOT_FOUND",
                ErrorClassification::FfmpegRequired => "FFMPEG_REQUIRED",
                ErrorClassification::BadUrl => "BAD_URL",
                ErrorClassification::InsufficientStorage => "INSUFFICIENT_STORAGE",
                ErrorClassification::CopyrightBlocked => "COPYRIGHT_BLOCKED",
                ErrorClassification::DownloadFailed => "DOWNLOAD_FAILED",
                ErrorClassification::InternalError => "INTERNAL_ERROR",
            },
            ApiError::Internal(_) => "INTERNAL_ERROR",
            ApiError::TemplateUnavailable => "TEMPLATE_UNAVAILABLE",
        }
    }

    /// Message safe to show to the client
    pub fn detail(&self) -> String {
        match self {
            ApiError::BadInput(msg) => msg.clone(),
            ApiError::Fetch(e) => e.detail.clone(),
            ApiError::Internal(_) => ErrorClassification::InternalError.message().to_string(),
            ApiError::TemplateUnavailable => TEMPLATE_UNAVAILABLE_MESSAGE.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            ApiError::Internal(cause) => error!(error = %cause, "Internal error while handling request"),
            ApiError::TemplateUnavailable => {
                error!("Templates not loaded, cannot serve HTML");
                return (
                    status,
                    [(header::CONTENT_TYPE, mime::TEXT_PLAIN_UTF_8.as_ref())],
                    TEMPLATE_UNAVAILABLE_MESSAGE,
                )
                    .into_response();
            }
            _ => {}
        }

        let body = ErrorResponse {
            code: self.code(),
            detail: self.detail(),
        };

        (status, Json(json!(body))).into_response()
    }
}
