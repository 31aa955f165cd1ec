//! Error types for the download engine.

use std::io;
use std::path::PathBuf;

/// Errors that can occur while downloading a file.
#[derive(Debug)]
pub enum DownloadError {
    /// Failed to create the HTTP client.
    Client(String),

    /// The request could not be sent or the connection dropped.
    Request { url: String, reason: String },

    /// The server answered with a non-success status code.
    Status { url: String, status: u16 },

    /// The request timed out.
    Timeout { url: String, timeout_secs: u64 },

    /// Reading the response body failed mid-stream.
    Read { url: String, reason: String },

    /// Failed to write the destination file.
    Write { path: PathBuf, source: io::Error },

    /// Failed to create the destination directory.
    CreateDir { path: PathBuf, source: io::Error },
}

impl DownloadError {
    /// Whether a retry has a chance of succeeding.
    ///
    /// Connection failures, timeouts, mid-stream read errors, and server
    /// errors are transient. Client errors (4xx) and local disk failures
    /// are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Request { .. } | Self::Timeout { .. } | Self::Read { .. } => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::Client(_) | Self::Write { .. } | Self::CreateDir { .. } => false,
        }
    }
}

impl std::fmt::Display for DownloadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Client(reason) => write!(f, "failed to create HTTP client: {}", reason),
            Self::Request { url, reason } => {
                write!(f, "request to {} failed: {}", url, reason)
            }
            Self::Status { url, status } => {
                write!(f, "download of {} failed with HTTP {}", url, status)
            }
            Self::Timeout { url, timeout_secs } => {
                write!(f, "request to {} timed out after {}s", url, timeout_secs)
            }
            Self::Read { url, reason } => {
                write!(f, "reading body of {} failed: {}", url, reason)
            }
            Self::Write { path, source } => {
                write!(f, "failed to write {}: {}", path.display(), source)
            }
            Self::CreateDir { path, source } => {
                write!(
                    f,
                    "failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
        }
    }
}

impl std::error::Error for DownloadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Write { source, .. } => Some(source),
            Self::CreateDir { source, .. } => Some(source),
            _ => None,
        }
    }
}
