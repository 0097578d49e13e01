use serde::Serialize;

use super::RetrievalError;

/// Failure categories surfaced to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClassification {
    NotFound,
    FfmpegRequired,
    BadUrl,
    InsufficientStorage,
    CopyrightBlocked,
    DownloadFailed,
    InternalError,
}

impl ErrorClassification {
    /// Client-facing message for this category
    pub fn message(&self) -> &'static str {
        match self {
            ErrorClassification::NotFound => "Video not found or unavailable.",
            ErrorClassification::FfmpegRequired => {
                "The requested format requires ffmpeg, which is not available on this server."
            }
            ErrorClassification::BadUrl => "Invalid or unsupported URL.",
            ErrorClassification::InsufficientStorage => "Insufficient storage space on server.",
            ErrorClassification::CopyrightBlocked => {
                "Content unavailable due to copyright restrictions."
            }
            ErrorClassification::DownloadFailed => "Failed to download audio.",
            ErrorClassification::InternalError => "An unexpected server error occurred.",
        }
    }
}

/// Table of `(needle, category)`; first match wins.
const RULES: &[(&str, ErrorClassification)] = &[
    ("video unavailable", ErrorClassification::NotFound),
    ("private video", ErrorClassification::NotFound),
    ("video not found", ErrorClassification::NotFound),
    ("ffmpeg", ErrorClassification::FfmpegRequired),
    ("unsupported url", ErrorClassification::BadUrl),
    ("no space left on device", ErrorClassification::InsufficientStorage),
    ("copyright", ErrorClassification::CopyrightBlocked),
];

/// Maps a retriever failure onto [`ErrorClassification`] by case-insensitive
/// substring match on its message.
///
/// The ffmpeg rule only applies when no local ffmpeg is configured. Failures
/// outside the retriever's own reporting are always `InternalError`.
pub fn classify(err: &RetrievalError, ffmpeg_available: bool) -> ErrorClassification {
    if matches!(err, RetrievalError::Unexpected(_)) {
        return ErrorClassification::InternalError;
    }

    let message = err.message().to_lowercase();
    RULES
        .iter()
        .filter(|(_, class)| !(ffmpeg_available && *class == ErrorClassification::FfmpegRequired))
        .find(|(needle, _)| message.contains(needle))
        .map(|(_, class)| *class)
        .unwrap_or(ErrorClassification::DownloadFailed)
}
