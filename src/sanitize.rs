//! Filename sanitization for `Content-Disposition` display names

/// Characters that are never allowed in a display name.
const FORBIDDEN: &[char] = &['\\', '/', '*', ':', '"', '<', '>', '|'];

/// Maximum display name length, in characters.
pub const MAX_FILENAME_CHARS: usize = 100;

/// Name used when nothing printable survives sanitization.
pub const FALLBACK_FILENAME: &str = "download";

/// Strips forbidden characters, bounds the length to [`MAX_FILENAME_CHARS`]
/// and trims surrounding whitespace. Never returns an empty string.
pub fn sanitize(raw: &str) -> String {
    let truncated: String = raw
        .chars()
        .filter(|c| !FORBIDDEN.contains(c))
        .take(MAX_FILENAME_CHARS)
        .collect();

    let trimmed = truncated.trim();
    if trimmed.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        trimmed.to_string()
    }
}
