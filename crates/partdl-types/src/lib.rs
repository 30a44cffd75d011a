//! Shared types for partdl
//!
//! This crate contains the data structures shared between the core
//! download engine and its consumers (CLI, anything rendering progress).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// Download Types
// ============================================================================

/// One download attempt: a source URL and the final destination path.
///
/// Immutable for the life of the attempt. The destination must not exist
/// when a session starts; completed files are never silently overwritten.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadTarget {
    pub url: String,
    pub destination: PathBuf,
}

impl DownloadTarget {
    pub fn new(url: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            destination: destination.into(),
        }
    }

    /// Path of the partial file for a given expected size:
    /// `<destination>.part_<expected_size>`.
    ///
    /// Keying the name on the expected size means two attempts that observe
    /// different Content-Length values for the same URL accumulate into
    /// different partial files instead of corrupting each other. The partial
    /// file's on-disk length is the only resume offset.
    pub fn part_path(&self, expected_size: u64) -> PathBuf {
        let mut name = self.destination.as_os_str().to_os_string();
        name.push(format!(".part_{}", expected_size));
        PathBuf::from(name)
    }
}

// ============================================================================
// Progress Types
// ============================================================================

/// One progress sample from a download session.
///
/// Emitted once per chunk written to the partial file, or once per caught
/// transient failure (in which case `error` carries the failure text and
/// `bytes_so_far` is unchanged).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub bytes_so_far: u64,
    pub total_bytes: u64,
    pub error: Option<String>,
}

impl ProgressEvent {
    /// Completed fraction in `0.0..=1.0`.
    pub fn fraction(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        (self.bytes_so_far as f64 / self.total_bytes as f64).clamp(0.0, 1.0)
    }

    /// Completed percentage in `0.0..=100.0`.
    pub fn percent(&self) -> f64 {
        self.fraction() * 100.0
    }

    /// True for events reporting a transient failure rather than progress.
    pub fn is_stalled(&self) -> bool {
        self.error.is_some()
    }
}
