//! Temporary storage for per-request audio files
//!
//! Every request reserves its own uniquely named path, gets it back wrapped in a
//! [`TempFileGuard`], and the guard removes the file when it is released. The
//! guard is consumed by [`TempFileGuard::validate`] into a [`TempAsset`], which
//! in turn is consumed by the streaming responder.

mod asset;
mod guard;

pub use asset::TempAsset;
pub use guard::{TempFileGuard, remove_temp_file, remove_temp_file_blocking};

use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

/// Prefix shared by every reserved file name.
pub const FILE_PREFIX: &str = "ytaudio_";

/// Extension of the audio container we ask the retriever for.
pub const AUDIO_EXTENSION: &str = "m4a";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("downloaded file is missing: {}", .0.display())]
    Missing(PathBuf),

    #[error("downloaded file is empty: {}", .0.display())]
    Empty(PathBuf),

    #[error("failed to inspect downloaded file: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StorageError>;

/// Allocates temp paths under a base directory, or the OS temp dir when the
/// base directory is unusable.
#[derive(Debug, Clone)]
pub struct TempStorage {
    base_dir: Option<PathBuf>,
}

impl TempStorage {
    pub fn new(base_dir: Option<PathBuf>) -> Self {
        Self { base_dir }
    }

    /// Reserves a fresh `ytaudio_<uuid>.m4a` path. Nothing is created on disk.
    pub async fn reserve(&self) -> TempFileGuard {
        let dir = self.resolve_dir().await;
        let id = Uuid::new_v4().simple();
        let path = dir.join(format!("{FILE_PREFIX}{id}.{AUDIO_EXTENSION}"));

        tracing::debug!(path = %path.display(), "Reserved temporary path");
        TempFileGuard::new(path)
    }

    async fn resolve_dir(&self) -> PathBuf {
        let Some(base) = &self.base_dir else {
            return std::env::temp_dir();
        };

        if let Err(e) = tokio::fs::create_dir_all(base).await {
            tracing::error!(
                dir = %base.display(),
                error = %e,
                "Failed to create temporary directory, using system temp dir"
            );
            return std::env::temp_dir();
        }

        match tokio::fs::canonicalize(base).await {
            Ok(dir) => dir,
            Err(e) => {
                tracing::warn!(dir = %base.display(), error = %e, "Failed to resolve temporary directory");
                std::env::temp_dir()
            }
        }
    }
}

/// Output template handed to the retriever: the reserved path with its
/// extension replaced by the `%(ext)s` placeholder.
pub fn output_template(path: &Path) -> PathBuf {
    path.with_extension("%(ext)s")
}
