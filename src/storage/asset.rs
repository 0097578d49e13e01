use std::path::Path;

use super::TempFileGuard;

/// A validated, non-empty download bound to one request.
///
/// The file is deleted when the asset (or the stream that consumes it) is
/// released.
#[derive(Debug)]
pub struct TempAsset {
    file: TempFileGuard,
    display_name: String,
    size_bytes: u64,
}

impl TempAsset {
    pub(super) fn new(file: TempFileGuard, display_name: String, size_bytes: u64) -> Self {
        Self {
            file,
            display_name,
            size_bytes,
        }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Hands ownership of the file to its final consumer.
    pub fn into_guard(self) -> TempFileGuard {
        self.file
    }
}
