use bon::Builder;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::RetrieverConfig;

/// Post-processing steps the retriever runs after the download
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostProcessor {
    EmbedThumbnail,
}

/// Options for one retrieval.
///
/// Built per request from the shared [`RetrieverConfig`] plus the per-request
/// overrides (output template, thumbnail flag, deadline) and never mutated
/// afterwards.
#[derive(Debug, Clone, Builder)]
pub struct DownloadOptions {
    /// Format selector, most preferred first
    #[builder(into)]
    pub format: String,

    /// Destination with a `%(ext)s` placeholder for the container extension
    #[builder(into)]
    pub output_template: PathBuf,

    /// Size of each ranged HTTP request, in bytes
    pub http_chunk_size: u64,

    /// Netscape cookie file, read-only
    #[builder(into)]
    pub cookie_file: Option<PathBuf>,

    /// Directory or binary of a local ffmpeg
    #[builder(into)]
    pub ffmpeg_location: Option<PathBuf>,

    /// Fetch the video thumbnail and embed it into the audio file
    #[builder(default)]
    pub embed_thumbnail: bool,

    /// Point after which the retriever should give up
    pub deadline: Option<Instant>,
}

impl DownloadOptions {
    /// Merges the base settings with the per-request overrides
    pub fn for_request(
        base: &RetrieverConfig,
        output_template: &Path,
        embed_thumbnail: bool,
        deadline: Instant,
    ) -> Self {
        DownloadOptions::builder()
            .format(base.format.clone())
            .output_template(output_template)
            .http_chunk_size(base.http_chunk_size.as_u64())
            .maybe_cookie_file(base.cookie_file.clone())
            .maybe_ffmpeg_location(base.ffmpeg_location.clone())
            .embed_thumbnail(embed_thumbnail)
            .deadline(deadline)
            .build()
    }

    /// Whether the thumbnail image must be fetched at all
    pub fn write_thumbnail(&self) -> bool {
        self.embed_thumbnail
    }

    pub fn post_processors(&self) -> Vec<PostProcessor> {
        if self.embed_thumbnail {
            vec![PostProcessor::EmbedThumbnail]
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_for_request_merges_base_and_overrides() {
        let base = RetrieverConfig::default();
        let deadline = Instant::now() + Duration::from_secs(30);
        let options = DownloadOptions::for_request(
            &base,
            Path::new("/tmp/ytaudio_x.%(ext)s"),
            false,
            deadline,
        );

        assert_eq!(options.format, "140/bestaudio[ext=m4a]/bestaudio");
        assert_eq!(options.output_template, PathBuf::from("/tmp/ytaudio_x.%(ext)s"));
        assert_eq!(options.http_chunk_size, 10 * 1024 * 1024);
        assert_eq!(options.cookie_file, Some(PathBuf::from("cookie.txt")));
        assert_eq!(options.deadline, Some(deadline));
        assert!(!options.write_thumbnail());
        assert!(options.post_processors().is_empty());
    }

    #[test]
    fn test_thumbnail_flag_adds_post_processor() {
        let options = DownloadOptions::builder()
            .format("bestaudio")
            .output_template("/tmp/out.%(ext)s")
            .http_chunk_size(1024)
            .embed_thumbnail(true)
            .build();

        assert!(options.write_thumbnail());
        assert_eq!(options.post_processors(), vec![PostProcessor::EmbedThumbnail]);
    }

    #[test]
    fn test_requests_do_not_share_overrides() {
        let base = RetrieverConfig::default();
        let deadline = Instant::now();
        let first = DownloadOptions::for_request(&base, Path::new("/a.%(ext)s"), true, deadline);
        let second = DownloadOptions::for_request(&base, Path::new("/b.%(ext)s"), false, deadline);

        assert!(first.embed_thumbnail);
        assert!(!second.embed_thumbnail);
        assert_ne!(first.output_template, second.output_template);
    }
}
