use crate::humanize::ByteSize;
use crate::streaming::DEFAULT_CHUNK_SIZE;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub download: DownloadConfig,
    #[serde(default)]
    pub retriever: RetrieverConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    /// Directory holding `index.html`
    #[serde(default = "default_templates_dir")]
    pub templates_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            templates_dir: default_templates_dir(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8000))
}

fn default_templates_dir() -> PathBuf {
    PathBuf::from("templates")
}

/// Per-download limits and temp file placement
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloadConfig {
    /// Base directory for temp files; falls back to the system temp dir when
    /// it cannot be created
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Retrievals allowed to run at the same time
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    /// Read size for streamed response chunks
    #[serde(default = "default_chunk_size")]
    pub chunk_size: ByteSize,
}

impl DownloadConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            temp_dir: default_temp_dir(),
            timeout_secs: default_timeout_secs(),
            max_concurrent: default_max_concurrent(),
            chunk_size: default_chunk_size(),
        }
    }
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from("tmp")
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_max_concurrent() -> usize {
    4
}

fn default_chunk_size() -> ByteSize {
    ByteSize(DEFAULT_CHUNK_SIZE as u64)
}

/// Base options handed to the external retriever on every request
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetrieverConfig {
    /// Retriever executable, looked up on `PATH` when relative
    #[serde(default = "default_binary")]
    pub binary: PathBuf,
    /// Format selector, most preferred first
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default = "default_http_chunk_size")]
    pub http_chunk_size: ByteSize,
    /// Passed before yt-dlp's own arguments
    #[serde(default)]
    pub args: Vec<String>,
    /// Netscape cookie file; skipped when it does not exist
    #[serde(default = "default_cookie_file")]
    pub cookie_file: Option<PathBuf>,
    /// Local ffmpeg. When unset, ffmpeg-related failures are reported as such.
    #[serde(default)]
    pub ffmpeg_location: Option<PathBuf>,
}

impl RetrieverConfig {
    pub fn ffmpeg_available(&self) -> bool {
        self.ffmpeg_location.is_some()
    }
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            args: Vec::new(),
            format: default_format(),
            http_chunk_size: default_http_chunk_size(),
            cookie_file: default_cookie_file(),
            ffmpeg_location: None,
        }
    }
}

fn default_binary() -> PathBuf {
    PathBuf::from("yt-dlp")
}

fn default_format() -> String {
    "140/bestaudio[ext=m4a]/bestaudio".to_string()
}

fn default_http_chunk_size() -> ByteSize {
    ByteSize::mib(10)
}

fn default_cookie_file() -> Option<PathBuf> {
    Some(PathBuf::from("cookie.txt"))
}
