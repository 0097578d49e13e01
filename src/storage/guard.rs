use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{StorageError, TempAsset};

/// Side files a retriever may leave next to the reserved path: partial
/// downloads, resume markers, fetched thumbnails and post-processor scratch.
const COMPANION_SUFFIXES: &[&str] = &[".part", ".ytdl"];
const COMPANION_EXTENSIONS: &[&str] = &["webp", "jpg", "jpeg", "png", "temp.m4a"];

/// Owns a reserved temp path and deletes it exactly once, together with any
/// companion files the retriever left next to it.
///
/// Deletion happens through [`TempFileGuard::remove`] or, if the guard is
/// dropped without that (early return, panic, task cancellation), from `Drop`
/// on the blocking pool.
#[derive(Debug)]
pub struct TempFileGuard {
    path: PathBuf,
    live: bool,
}

impl TempFileGuard {
    pub(super) fn new(path: PathBuf) -> Self {
        Self { path, live: true }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Deletes the file and its companions now. Missing files are not an error.
    pub async fn remove(mut self) {
        if !std::mem::take(&mut self.live) {
            return;
        }
        for companion in companions(&self.path) {
            remove_temp_file(&companion).await;
        }
        remove_temp_file(&self.path).await;
    }

    /// Checks that the retriever produced a non-empty regular file.
    ///
    /// On failure the file is removed before the error is returned.
    pub async fn validate(self, display_name: String) -> Result<TempAsset, StorageError> {
        match tokio::fs::metadata(&self.path).await {
            Ok(meta) if meta.is_file() && meta.len() > 0 => {
                Ok(TempAsset::new(self, display_name, meta.len()))
            }
            Ok(_) => {
                tracing::error!(path = %self.path.display(), "Downloaded file is empty");
                let path = self.path.clone();
                self.remove().await;
                Err(StorageError::Empty(path))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::error!(path = %self.path.display(), "Downloaded file not found");
                let path = self.path.clone();
                self.remove().await;
                Err(StorageError::Missing(path))
            }
            Err(e) => {
                tracing::error!(path = %self.path.display(), error = %e, "Failed to stat downloaded file");
                self.remove().await;
                Err(StorageError::Io(e))
            }
        }
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if !std::mem::take(&mut self.live) {
            return;
        }

        let path = std::mem::take(&mut self.path);
        let sweep = move || {
            for companion in companions(&path) {
                remove_temp_file_blocking(&companion);
            }
            remove_temp_file_blocking(&path);
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(sweep);
            }
            Err(_) => sweep(),
        }
    }
}

/// Side files derived from a reserved path
fn companions(path: &Path) -> Vec<PathBuf> {
    let mut paths = Vec::with_capacity(COMPANION_SUFFIXES.len() + COMPANION_EXTENSIONS.len());

    for suffix in COMPANION_SUFFIXES {
        let mut name = path.as_os_str().to_os_string();
        name.push(suffix);
        paths.push(PathBuf::from(name));
    }
    for ext in COMPANION_EXTENSIONS {
        paths.push(path.with_extension(ext));
    }

    paths
}

/// Idempotent delete: a missing file is logged at debug and ignored, any other
/// failure is logged and swallowed.
pub async fn remove_temp_file(path: &Path) {
    log_removal(path, tokio::fs::remove_file(path).await);
}

/// Blocking variant of [`remove_temp_file`] for contexts without a runtime.
pub fn remove_temp_file_blocking(path: &Path) {
    log_removal(path, std::fs::remove_file(path));
}

fn log_removal(path: &Path, result: std::io::Result<()>) {
    match result {
        Ok(()) => tracing::info!(path = %path.display(), "Removed temporary file"),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "Temporary file already gone")
        }
        Err(e) => tracing::error!(
            path = %path.display(),
            error = %e,
            "Failed to remove temporary file"
        ),
    }
}
