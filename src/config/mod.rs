//! Configuration management for ytaudio
//!
//! Settings are layered, lowest priority first:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables
//!
//! # Usage
//!
//! ```no_run
//! use ytaudio::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Server listening on: {}", config.server.bind_addr);
//! ```
//!
//! # Environment Variables
//!
//! Any key can be overridden with `YTAUDIO__<section>__<key>`:
//! - `YTAUDIO__SERVER__BIND_ADDR=127.0.0.1:9000`
//! - `YTAUDIO__DOWNLOAD__TIMEOUT_SECS=120`
//! - `YTAUDIO__RETRIEVER__FFMPEG_LOCATION=/usr/bin/ffmpeg`
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/ytaudio.toml`.
//! This can be overridden using the `YTAUDIO_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use crate::humanize::ByteSize;
pub use models::{Config, DownloadConfig, RetrieverConfig, ServerConfig};
pub use validation::{MAX_CHUNK_SIZE, ValidationError};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is malformed or a value is
    /// out of range.
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(&config_path, "[download]\ntimeout_secs = 30\n").unwrap();

        let config = Config::load_from_path(config_path).unwrap();
        assert_eq!(config.download.timeout(), std::time::Duration::from_secs(30));
        assert_eq!(config.download.max_concurrent, 4);
    }

    #[test]
    fn test_validation_runs_after_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(&config_path, "[download]\nchunk_size = \"16MB\"\n").unwrap();

        let result = Config::load_from_path(config_path);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ValidationError(ValidationError::ChunkSizeOutOfRange { .. })
        ));
    }

    #[test]
    fn test_retriever_leading_args() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(
            &config_path,
            "[retriever]\nbinary = \"python3\"\nargs = [\"-m\", \"yt_dlp\"]\n",
        )
        .unwrap();

        let config = Config::load_from_path(config_path).unwrap();
        assert_eq!(config.retriever.binary, std::path::PathBuf::from("python3"));
        assert_eq!(config.retriever.args, vec!["-m", "yt_dlp"]);
        assert!(Config::default().retriever.args.is_empty());
    }

    #[test]
    fn test_malformed_file_is_load_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(&config_path, "[download]\ntimeout_secs = \"soon\"\n").unwrap();

        let result = Config::load_from_path(config_path);
        assert!(matches!(result.unwrap_err(), ConfigError::LoadError(_)));
    }
}
