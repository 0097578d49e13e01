use super::models::Config;
use config::{ConfigError, Environment, File};
use std::env;
use std::path::PathBuf;

const CONFIG_ENV_VAR: &str = "YTAUDIO_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/ytaudio.toml";
const ENV_PREFIX: &str = "YTAUDIO";
const ENV_SEPARATOR: &str = "__";

/// Path of the configuration file, honouring `YTAUDIO_CONFIG`
pub fn config_path() -> PathBuf {
    env::var(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Load configuration from multiple sources with priority:
/// 1. Defaults (embedded in structs)
/// 2. TOML file (if exists)
/// 3. Environment variables from .env file (via dotenvy)
/// 4. System environment variables (highest priority)
pub fn load() -> Result<Config, ConfigError> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    load_from_sources(config_path())
}

/// Load configuration from a specific path and environment
pub fn load_from_sources(config_path: PathBuf) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if config_path.exists() {
        tracing::info!("Loading configuration from: {}", config_path.display());
        builder = builder.add_source(File::from(config_path).required(false));
    } else {
        tracing::warn!(
            "Configuration file not found at {}, using defaults and environment overrides",
            config_path.display()
        );
    }

    // YTAUDIO__DOWNLOAD__TIMEOUT_SECS -> download.timeout_secs
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    let config = builder.build()?;
    config.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::humanize::ByteSize;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_defaults_only() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let config = load_from_sources(config_path).unwrap();
        assert_eq!(config.server.bind_addr.to_string(), "0.0.0.0:8000");
        assert_eq!(config.download.timeout_secs, 300);
        assert_eq!(config.download.chunk_size, ByteSize::kib(64));
        assert_eq!(config.retriever.binary, PathBuf::from("yt-dlp"));
        assert!(config.retriever.ffmpeg_location.is_none());
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[server]
bind_addr = "127.0.0.1:9000"
templates_dir = "web"

[download]
temp_dir = "/var/tmp/ytaudio"
timeout_secs = 60
max_concurrent = 2
chunk_size = "128KB"

[retriever]
format = "bestaudio"
http_chunk_size = "1MB"
ffmpeg_location = "/usr/bin/ffmpeg"
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = load_from_sources(config_path).unwrap();
        assert_eq!(config.server.bind_addr.to_string(), "127.0.0.1:9000");
        assert_eq!(config.server.templates_dir, PathBuf::from("web"));
        assert_eq!(config.download.temp_dir, PathBuf::from("/var/tmp/ytaudio"));
        assert_eq!(config.download.timeout_secs, 60);
        assert_eq!(config.download.max_concurrent, 2);
        assert_eq!(config.download.chunk_size, ByteSize::kib(128));
        assert_eq!(config.retriever.format, "bestaudio");
        assert_eq!(config.retriever.http_chunk_size, ByteSize::mib(1));
        assert!(config.retriever.ffmpeg_available());
        // Untouched keys keep their defaults
        assert_eq!(config.retriever.cookie_file, Some(PathBuf::from("cookie.txt")));
    }

    // Environment overrides are not exercised here: mutating the process
    // environment is unsafe under the parallel test runner.
}
