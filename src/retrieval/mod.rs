//! Bridge to the external media retrieval capability
//!
//! ## Key Components
//!
//! - [`MediaRetriever`] - blocking "URL in, audio file out" capability
//! - [`YtDlp`] - production retriever driving the `yt-dlp` executable
//! - [`DownloadOptions`] - immutable per-request option set
//! - [`AudioFetcher`] - offloads retrieval to the blocking pool, validates the
//!   result and classifies failures
//! - [`ErrorClassification`] - failure taxonomy derived from retriever messages

mod classify;
mod fetcher;
mod options;
mod ytdlp;

pub use classify::{ErrorClassification, classify};
pub use fetcher::{AudioFetcher, FetchError, FetchSettings};
pub use options::{DownloadOptions, PostProcessor};
pub use ytdlp::YtDlp;

use serde::Deserialize;
use thiserror::Error;

/// Failure reported by a [`MediaRetriever`].
///
/// The variant records which layer failed; the message is the retriever's own
/// text and is what [`classify`] matches against.
#[derive(Debug, Clone, Error)]
pub enum RetrievalError {
    /// Metadata extraction failed (unavailable video, unsupported URL, ...)
    #[error("{0}")]
    Extractor(String),

    /// The media download itself failed
    #[error("{0}")]
    Download(String),

    /// Anything outside the retriever's own error reporting
    #[error("{0}")]
    Unexpected(String),
}

impl RetrievalError {
    pub fn message(&self) -> &str {
        match self {
            RetrievalError::Extractor(msg)
            | RetrievalError::Download(msg)
            | RetrievalError::Unexpected(msg) => msg,
        }
    }
}

/// Video metadata returned by the extraction step
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct VideoMetadata {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// External capability that turns a video URL into a local audio file.
///
/// Both calls block (network and disk I/O) and are only ever invoked from the
/// blocking pool by [`AudioFetcher`].
pub trait MediaRetriever: Send + Sync + 'static {
    /// Fetches metadata without downloading any media bytes
    fn extract_metadata(
        &self,
        url: &str,
        options: &DownloadOptions,
    ) -> Result<VideoMetadata, RetrievalError>;

    /// Downloads the audio stream to `options.output_template`
    fn download(&self, url: &str, options: &DownloadOptions) -> Result<(), RetrievalError>;
}
