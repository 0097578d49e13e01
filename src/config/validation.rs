use super::models::Config;
use crate::humanize::ByteSize;
use thiserror::Error;

/// Upper bound for a single response chunk
pub const MAX_CHUNK_SIZE: ByteSize = ByteSize::mib(8);

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("download.timeout_secs must be positive")]
    ZeroTimeout,

    #[error("download.max_concurrent must be positive")]
    ZeroConcurrency,

    #[error("download.chunk_size must be between 1B and {max} (got {actual})")]
    ChunkSizeOutOfRange { actual: ByteSize, max: ByteSize },

    #[error("retriever.http_chunk_size must be positive")]
    ZeroHttpChunkSize,

    #[error("retriever.format must not be empty")]
    EmptyFormat,

    #[error("retriever.binary must not be empty")]
    EmptyBinary,
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_download(config)?;
    validate_retriever(config)?;
    Ok(())
}

fn validate_download(config: &Config) -> Result<(), ValidationError> {
    let download = &config.download;

    if download.timeout_secs == 0 {
        return Err(ValidationError::ZeroTimeout);
    }
    if download.max_concurrent == 0 {
        return Err(ValidationError::ZeroConcurrency);
    }
    if download.chunk_size.as_u64() == 0 || download.chunk_size > MAX_CHUNK_SIZE {
        return Err(ValidationError::ChunkSizeOutOfRange {
            actual: download.chunk_size,
            max: MAX_CHUNK_SIZE,
        });
    }

    Ok(())
}

fn validate_retriever(config: &Config) -> Result<(), ValidationError> {
    let retriever = &config.retriever;

    if retriever.http_chunk_size.as_u64() == 0 {
        return Err(ValidationError::ZeroHttpChunkSize);
    }
    if retriever.format.trim().is_empty() {
        return Err(ValidationError::EmptyFormat);
    }
    if retriever.binary.as_os_str().is_empty() {
        return Err(ValidationError::EmptyBinary);
    }

    Ok(())
}
