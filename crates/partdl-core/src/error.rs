//! Error types for the partdl core

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while downloading.
///
/// Only `Network` errors are transient; the engine converts them into
/// stalled progress events and retries. Everything else aborts the session
/// immediately and leaves the partial file untouched on disk.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("destination file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("server did not report a content length for {0}")]
    UnknownSize(String),

    #[error("downloaded size {actual} does not match the expected size {expected}")]
    SizeMismatch { expected: u64, actual: u64 },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DownloadError {
    /// Check if this error is retryable.
    ///
    /// Inside a running session retryable errors never surface as `Err`;
    /// they come back as `ProgressEvent::error`. This is for callers that
    /// want to classify a fatal probe failure.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DownloadError::Network(_))
    }
}

pub type Result<T> = std::result::Result<T, DownloadError>;
