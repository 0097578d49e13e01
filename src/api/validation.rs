use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Shortest input worth matching against the URL pattern
pub const MIN_URL_CHARS: usize = 10;

// Optional scheme, optional www., then a watch URL or a short link, a
// video-id-like segment and an optional trailing query.
static VIDEO_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(https?://)?(www\.)?(youtube\.com/watch\?v=|youtu\.be/)[\w-]+(&\S*)?$")
        .expect("video URL pattern is valid")
});

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UrlValidationError {
    #[error("url must be at least {MIN_URL_CHARS} characters long")]
    TooShort,
    #[error(
        "Invalid YouTube URL format. Please use a valid video URL (e.g., https://www.youtube.com/watch?v=...)."
    )]
    NotAVideoUrl,
}

/// Accepts only single-video YouTube URLs
pub fn validate_video_url(url: &str) -> Result<(), UrlValidationError> {
    if url.chars().count() < MIN_URL_CHARS {
        return Err(UrlValidationError::TooShort);
    }
    if !VIDEO_URL.is_match(url) {
        return Err(UrlValidationError::NotAVideoUrl);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_video_urls() {
        for url in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "http://youtube.com/watch?v=dQw4w9WgXcQ",
            "www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
            "youtu.be/dQw4w9WgXcQ",
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42s",
            "https://www.youtube.com/watch?v=a-b_c",
        ] {
            assert_eq!(validate_video_url(url), Ok(()), "{url}");
        }
    }

    #[test]
    fn test_rejects_other_urls() {
        for url in [
            "ftp://example.com/x",
            "not a url",
            "https://vimeo.com/123456",
            "https://www.youtube.com/playlist?list=PL123",
            "https://www.youtube.com/watch?v=",
            "https://www.youtube.com/watch?v=abc def",
            "https://www.youtube.com/watch?v=abc?x=1",
        ] {
            assert!(validate_video_url(url).is_err(), "{url}");
        }
    }

    #[test]
    fn test_short_input_rejected_before_pattern() {
        assert_eq!(validate_video_url("youtu.be/"), Err(UrlValidationError::TooShort));
        assert_eq!(validate_video_url(""), Err(UrlValidationError::TooShort));
    }
}
