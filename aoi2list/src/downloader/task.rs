//! Download task state.

use std::path::PathBuf;

/// Lifecycle of a single download task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Queued, not yet started.
    Pending,
    /// Currently being transferred.
    InProgress,
    /// Fully written to the destination.
    Succeeded,
    /// Gave up after exhausting retries (or a non-transient failure).
    Failed,
    /// Skipped or aborted because the session was cancelled.
    Cancelled,
}

/// One file to download.
///
/// Mutated only by the download engine that owns the session.
#[derive(Debug, Clone)]
pub struct DownloadTask {
    /// Source URL.
    pub url: String,
    /// Destination file path; overwritten if it already exists.
    pub destination: PathBuf,
    /// Current lifecycle state.
    pub status: TaskStatus,
    /// Bytes written so far in the current attempt.
    pub bytes_downloaded: u64,
    /// Expected size from the server, when known.
    pub total_bytes: Option<u64>,
    /// Number of attempts made, including the successful one.
    pub attempt_count: u32,
}

impl DownloadTask {
    /// Creates a pending task.
    pub fn new(url: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            destination: destination.into(),
            status: TaskStatus::Pending,
            bytes_downloaded: 0,
            total_bytes: None,
            attempt_count: 0,
        }
    }

    /// Whether the task reached a terminal state.
    pub fn is_finished(&self) -> bool {
        matches!(
            self.status,
            TaskStatus::Succeeded | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }
}
