//! Core download loop: sequential tasks, chunked streaming, retries,
//! and cooperative cancellation.

use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, error, info, warn};

use super::error::DownloadError;
use super::progress::{ProgressCallback, ProgressUpdate, SpeedTracker};
use super::task::{DownloadTask, TaskStatus};
use super::transport::{Transport, DEFAULT_TIMEOUT};

/// Buffer size for reading/writing during downloads (64KB).
const BUFFER_SIZE: usize = 64 * 1024;

/// Default number of attempts per file, including the first.
const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Tunable settings for a download session.
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// HTTP timeout per request.
    pub timeout: Duration,
    /// Attempts per file before marking it failed (minimum 1).
    pub max_attempts: u32,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl DownloadConfig {
    /// Sets the HTTP timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the attempts per file.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Every task ran to a terminal state without cancellation.
    Completed,
    /// The cancellation flag was set; remaining tasks were skipped.
    Cancelled,
}

/// Final report of a download session.
#[derive(Debug)]
pub struct SessionSummary {
    /// How the session ended.
    pub outcome: SessionOutcome,
    /// All tasks with their final state.
    pub tasks: Vec<DownloadTask>,
}

impl SessionSummary {
    /// Number of tasks that succeeded.
    pub fn succeeded(&self) -> usize {
        self.count(TaskStatus::Succeeded)
    }

    /// Number of tasks that failed after exhausting retries.
    pub fn failed(&self) -> usize {
        self.count(TaskStatus::Failed)
    }

    /// Number of tasks skipped or aborted by cancellation.
    pub fn cancelled(&self) -> usize {
        self.count(TaskStatus::Cancelled)
    }

    /// Whether every task succeeded.
    pub fn all_succeeded(&self) -> bool {
        self.succeeded() == self.tasks.len()
    }

    fn count(&self, status: TaskStatus) -> usize {
        self.tasks.iter().filter(|t| t.status == status).count()
    }
}

/// Outcome of a single download attempt.
enum AttemptError {
    /// The cancellation flag was observed mid-transfer.
    Cancelled,
    /// The attempt failed; the caller decides whether to retry.
    Failed(DownloadError),
}

/// Runs all tasks sequentially against the given transport.
///
/// Each task streams to its destination in 64 KiB chunks, invoking the
/// progress callback after every chunk. Transient failures are retried
/// with the task's byte progress reset, up to `config.max_attempts`
/// attempts in total. The cancellation flag is checked between chunks
/// and between tasks; when set, the in-flight partial file is removed
/// and all remaining tasks are marked [`TaskStatus::Cancelled`].
///
/// Already-completed files are never touched by cancellation.
pub fn run_session<T: Transport>(
    transport: &T,
    mut tasks: Vec<DownloadTask>,
    config: &DownloadConfig,
    cancel: &AtomicBool,
    on_progress: Option<&ProgressCallback>,
) -> SessionSummary {
    let task_total = tasks.len();
    info!(tasks = task_total, "download session started");

    for index in 0..task_total {
        if cancel.load(Ordering::SeqCst) {
            tasks[index].status = TaskStatus::Cancelled;
            continue;
        }

        download_task(
            transport,
            &mut tasks[index],
            index,
            task_total,
            config,
            cancel,
            on_progress,
        );
    }

    let outcome = if tasks.iter().any(|t| t.status == TaskStatus::Cancelled) {
        SessionOutcome::Cancelled
    } else {
        SessionOutcome::Completed
    };

    let summary = SessionSummary { outcome, tasks };
    info!(
        succeeded = summary.succeeded(),
        failed = summary.failed(),
        cancelled = summary.cancelled(),
        "download session finished"
    );
    summary
}

/// Downloads one task, retrying transient failures.
fn download_task<T: Transport>(
    transport: &T,
    task: &mut DownloadTask,
    index: usize,
    task_total: usize,
    config: &DownloadConfig,
    cancel: &AtomicBool,
    on_progress: Option<&ProgressCallback>,
) {
    task.total_bytes = transport.content_length(&task.url);
    let max_attempts = config.max_attempts.max(1);

    loop {
        task.attempt_count += 1;
        task.status = TaskStatus::InProgress;
        task.bytes_downloaded = 0;

        match stream_to_file(transport, task, index, task_total, cancel, on_progress) {
            Ok(bytes) => {
                task.bytes_downloaded = bytes;
                task.status = TaskStatus::Succeeded;
                debug!(url = %task.url, bytes, attempts = task.attempt_count, "download complete");
                return;
            }
            Err(AttemptError::Cancelled) => {
                discard_partial(&task.destination);
                task.status = TaskStatus::Cancelled;
                info!(url = %task.url, "download cancelled");
                return;
            }
            Err(AttemptError::Failed(err)) => {
                discard_partial(&task.destination);
                if err.is_transient() && task.attempt_count < max_attempts {
                    warn!(
                        url = %task.url,
                        attempt = task.attempt_count,
                        error = %err,
                        "transient download failure, retrying"
                    );
                    continue;
                }
                error!(
                    url = %task.url,
                    attempts = task.attempt_count,
                    error = %err,
                    "download failed"
                );
                task.status = TaskStatus::Failed;
                return;
            }
        }
    }
}

/// Streams one attempt to the destination file.
fn stream_to_file<T: Transport>(
    transport: &T,
    task: &mut DownloadTask,
    index: usize,
    task_total: usize,
    cancel: &AtomicBool,
    on_progress: Option<&ProgressCallback>,
) -> Result<u64, AttemptError> {
    if let Some(parent) = task.destination.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            AttemptError::Failed(DownloadError::CreateDir {
                path: parent.to_path_buf(),
                source: e,
            })
        })?;
    }

    let mut body = transport.open(&task.url).map_err(AttemptError::Failed)?;

    // File::create truncates, so a previous partial attempt or an
    // existing file at the destination is overwritten.
    let file = File::create(&task.destination).map_err(|e| {
        AttemptError::Failed(DownloadError::Write {
            path: task.destination.clone(),
            source: e,
        })
    })?;
    let mut writer = BufWriter::new(file);
    let mut buffer = vec![0u8; BUFFER_SIZE];
    let mut tracker = SpeedTracker::new();

    loop {
        let bytes_read = body.read(&mut buffer).map_err(|e| {
            AttemptError::Failed(DownloadError::Read {
                url: task.url.clone(),
                reason: e.to_string(),
            })
        })?;

        if bytes_read == 0 {
            break;
        }

        if cancel.load(Ordering::SeqCst) {
            return Err(AttemptError::Cancelled);
        }

        writer.write_all(&buffer[..bytes_read]).map_err(|e| {
            AttemptError::Failed(DownloadError::Write {
                path: task.destination.clone(),
                source: e,
            })
        })?;

        task.bytes_downloaded += bytes_read as u64;
        tracker.record(task.bytes_downloaded);

        if let Some(cb) = on_progress {
            cb(ProgressUpdate {
                task_index: index,
                task_total,
                bytes_downloaded: task.bytes_downloaded,
                total_bytes: task.total_bytes,
                bytes_per_sec: tracker.bytes_per_sec(),
            });
        }
    }

    writer.flush().map_err(|e| {
        AttemptError::Failed(DownloadError::Write {
            path: task.destination.clone(),
            source: e,
        })
    })?;

    // A body shorter than the advertised size means the connection was
    // cut; treat it like any other mid-stream failure.
    if let Some(total) = task.total_bytes {
        if task.bytes_downloaded < total {
            return Err(AttemptError::Failed(DownloadError::Read {
                url: task.url.clone(),
                reason: format!(
                    "truncated body: got {} of {} bytes",
                    task.bytes_downloaded, total
                ),
            }));
        }
    }

    Ok(task.bytes_downloaded)
}

/// Removes a partial file, ignoring a missing destination.
fn discard_partial(path: &Path) {
    fs::remove_file(path).ok();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::atomic::AtomicUsize;
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;

    /// Reader that yields `data` in fixed-size chunks, optionally failing
    /// once a byte offset is reached.
    struct ChunkReader {
        data: Vec<u8>,
        pos: usize,
        chunk: usize,
        fail_at: Option<usize>,
    }

    impl Read for ChunkReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if let Some(fail_at) = self.fail_at {
                if self.pos >= fail_at {
                    return Err(io::Error::new(
                        io::ErrorKind::ConnectionReset,
                        "connection reset by peer",
                    ));
                }
            }
            let remaining = self.data.len() - self.pos;
            let n = remaining.min(self.chunk).min(buf.len());
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    /// Transport whose behavior is scripted per `open` call.
    struct ScriptedTransport {
        body: Vec<u8>,
        chunk: usize,
        calls: AtomicUsize,
        /// `open` fails with a transient error this many times first.
        failures_before_success: usize,
        /// All `open` calls fail with this HTTP status.
        fail_status: Option<u16>,
        /// The first stream dies mid-body at this byte offset.
        first_stream_fails_at: Option<usize>,
        advertise_length: bool,
    }

    impl ScriptedTransport {
        fn serving(body: &[u8], chunk: usize) -> Self {
            Self {
                body: body.to_vec(),
                chunk,
                calls: AtomicUsize::new(0),
                failures_before_success: 0,
                fail_status: None,
                first_stream_fails_at: None,
                advertise_length: true,
            }
        }
    }

    impl Transport for ScriptedTransport {
        fn content_length(&self, _url: &str) -> Option<u64> {
            self.advertise_length.then(|| self.body.len() as u64)
        }

        fn open(&self, url: &str) -> Result<Box<dyn Read + Send>, DownloadError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);

            if let Some(status) = self.fail_status {
                return Err(DownloadError::Status {
                    url: url.to_string(),
                    status,
                });
            }
            if call < self.failures_before_success {
                return Err(DownloadError::Request {
                    url: url.to_string(),
                    reason: "connection reset by peer".to_string(),
                });
            }

            let fail_at = (call == self.failures_before_success)
                .then_some(self.first_stream_fails_at)
                .flatten();

            Ok(Box::new(ChunkReader {
                data: self.body.clone(),
                pos: 0,
                chunk: self.chunk,
                fail_at,
            }))
        }
    }

    fn one_task(dir: &Path) -> Vec<DownloadTask> {
        vec![DownloadTask::new(
            "https://example.com/tile.laz",
            dir.join("tile.laz"),
        )]
    }

    #[test]
    fn test_single_download_succeeds() {
        let dir = tempdir().unwrap();
        let body = b"LASF-compressed-point-data".repeat(10);
        let transport = ScriptedTransport::serving(&body, 7);

        let summary = run_session(
            &transport,
            one_task(dir.path()),
            &DownloadConfig::default(),
            &AtomicBool::new(false),
            None,
        );

        assert_eq!(summary.outcome, SessionOutcome::Completed);
        assert_eq!(summary.succeeded(), 1);
        let task = &summary.tasks[0];
        assert_eq!(task.status, TaskStatus::Succeeded);
        assert_eq!(task.attempt_count, 1);
        assert_eq!(task.bytes_downloaded, body.len() as u64);
        assert_eq!(std::fs::read(dir.path().join("tile.laz")).unwrap(), body);
    }

    #[test]
    fn test_fails_twice_then_succeeds_reports_three_attempts() {
        let dir = tempdir().unwrap();
        let body = b"point cloud bytes";
        let mut transport = ScriptedTransport::serving(body, 4);
        transport.failures_before_success = 2;

        let summary = run_session(
            &transport,
            one_task(dir.path()),
            &DownloadConfig::default(),
            &AtomicBool::new(false),
            None,
        );

        let task = &summary.tasks[0];
        assert_eq!(task.status, TaskStatus::Succeeded);
        assert_eq!(task.attempt_count, 3);
        assert_eq!(
            std::fs::read(dir.path().join("tile.laz")).unwrap(),
            body.to_vec()
        );
    }

    #[test]
    fn test_exhausted_retries_marks_failed_and_removes_partial() {
        let dir = tempdir().unwrap();
        let mut transport = ScriptedTransport::serving(b"unreachable", 4);
        transport.failures_before_success = 10;

        let summary = run_session(
            &transport,
            one_task(dir.path()),
            &DownloadConfig::default(),
            &AtomicBool::new(false),
            None,
        );

        let task = &summary.tasks[0];
        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.attempt_count, 3);
        assert!(!dir.path().join("tile.laz").exists());
        assert_eq!(summary.outcome, SessionOutcome::Completed);
    }

    #[test]
    fn test_non_transient_status_fails_without_retry() {
        let dir = tempdir().unwrap();
        let mut transport = ScriptedTransport::serving(b"", 4);
        transport.fail_status = Some(404);

        let summary = run_session(
            &transport,
            one_task(dir.path()),
            &DownloadConfig::default(),
            &AtomicBool::new(false),
            None,
        );

        let task = &summary.tasks[0];
        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.attempt_count, 1);
    }

    #[test]
    fn test_mid_stream_failure_retries_with_progress_reset() {
        let dir = tempdir().unwrap();
        let body = b"0123456789abcdef";
        let mut transport = ScriptedTransport::serving(body, 4);
        transport.first_stream_fails_at = Some(8);

        let updates = Arc::new(Mutex::new(Vec::new()));
        let updates_clone = Arc::clone(&updates);
        let cb: ProgressCallback = Box::new(move |u: ProgressUpdate| {
            updates_clone.lock().unwrap().push(u.bytes_downloaded);
        });

        let summary = run_session(
            &transport,
            one_task(dir.path()),
            &DownloadConfig::default(),
            &AtomicBool::new(false),
            Some(&cb),
        );

        let task = &summary.tasks[0];
        assert_eq!(task.status, TaskStatus::Succeeded);
        assert_eq!(task.attempt_count, 2);
        assert_eq!(
            std::fs::read(dir.path().join("tile.laz")).unwrap(),
            body.to_vec()
        );

        // Byte counters restart from the beginning on the retry.
        let updates = updates.lock().unwrap();
        let reset_index = updates.iter().skip(1).position(|&b| b <= 4);
        assert!(reset_index.is_some(), "expected progress reset after retry");
    }

    #[test]
    fn test_truncated_body_is_retried() {
        let dir = tempdir().unwrap();
        let body = b"full body contents here";
        // Serve only a prefix of the advertised size: every attempt ends
        // truncated, so the task fails after max attempts.
        let inner = ScriptedTransport::serving(&body[..10], 8);

        struct FixedLength<T>(T, u64);
        impl<T: Transport> Transport for FixedLength<T> {
            fn content_length(&self, _url: &str) -> Option<u64> {
                Some(self.1)
            }
            fn open(&self, url: &str) -> Result<Box<dyn Read + Send>, DownloadError> {
                self.0.open(url)
            }
        }

        let transport = FixedLength(inner, body.len() as u64);
        let summary = run_session(
            &transport,
            one_task(dir.path()),
            &DownloadConfig::default(),
            &AtomicBool::new(false),
            None,
        );

        let task = &summary.tasks[0];
        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.attempt_count, 3);
        assert!(!dir.path().join("tile.laz").exists());
    }

    #[test]
    fn test_cancellation_mid_transfer_removes_partial_file() {
        let dir = tempdir().unwrap();
        let body = vec![0xAB; 64];
        let transport = ScriptedTransport::serving(&body, 8);

        let cancel = Arc::new(AtomicBool::new(false));
        let cancel_from_cb = Arc::clone(&cancel);
        // Cancel as soon as the first chunk lands.
        let cb: ProgressCallback = Box::new(move |_u: ProgressUpdate| {
            cancel_from_cb.store(true, Ordering::SeqCst);
        });

        let tasks = vec![
            DownloadTask::new("https://example.com/a.laz", dir.path().join("a.laz")),
            DownloadTask::new("https://example.com/b.laz", dir.path().join("b.laz")),
        ];

        let summary = run_session(
            &transport,
            tasks,
            &DownloadConfig::default(),
            &cancel,
            Some(&cb),
        );

        assert_eq!(summary.outcome, SessionOutcome::Cancelled);
        assert_eq!(summary.cancelled(), 2);
        assert_eq!(summary.succeeded(), 0);
        assert!(!dir.path().join("a.laz").exists());
        assert!(!dir.path().join("b.laz").exists());
    }

    #[test]
    fn test_cancellation_preserves_completed_files() {
        let dir = tempdir().unwrap();
        let body = vec![0xCD; 32];
        let transport = ScriptedTransport::serving(&body, 32);

        let cancel = Arc::new(AtomicBool::new(false));
        let cancel_from_cb = Arc::clone(&cancel);
        // First task finishes in one chunk; cancel once it completes.
        let cb: ProgressCallback = Box::new(move |u: ProgressUpdate| {
            if u.task_index == 0 && u.bytes_downloaded == 32 {
                cancel_from_cb.store(true, Ordering::SeqCst);
            }
        });

        let tasks = vec![
            DownloadTask::new("https://example.com/a.laz", dir.path().join("a.laz")),
            DownloadTask::new("https://example.com/b.laz", dir.path().join("b.laz")),
        ];

        let summary = run_session(
            &transport,
            tasks,
            &DownloadConfig::default(),
            &cancel,
            Some(&cb),
        );

        assert_eq!(summary.outcome, SessionOutcome::Cancelled);
        assert_eq!(summary.succeeded(), 1);
        assert_eq!(summary.cancelled(), 1);
        assert!(dir.path().join("a.laz").exists());
        assert!(!dir.path().join("b.laz").exists());
    }

    #[test]
    fn test_failed_task_does_not_stop_session() {
        let dir = tempdir().unwrap();

        struct FailFirst {
            inner: ScriptedTransport,
        }
        impl Transport for FailFirst {
            fn content_length(&self, url: &str) -> Option<u64> {
                self.inner.content_length(url)
            }
            fn open(&self, url: &str) -> Result<Box<dyn Read + Send>, DownloadError> {
                if url.ends_with("bad.laz") {
                    return Err(DownloadError::Status {
                        url: url.to_string(),
                        status: 404,
                    });
                }
                self.inner.open(url)
            }
        }

        let transport = FailFirst {
            inner: ScriptedTransport::serving(b"good bytes", 4),
        };
        let tasks = vec![
            DownloadTask::new("https://example.com/bad.laz", dir.path().join("bad.laz")),
            DownloadTask::new("https://example.com/good.laz", dir.path().join("good.laz")),
        ];

        let summary = run_session(
            &transport,
            tasks,
            &DownloadConfig::default(),
            &AtomicBool::new(false),
            None,
        );

        assert_eq!(summary.outcome, SessionOutcome::Completed);
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.succeeded(), 1);
        assert!(dir.path().join("good.laz").exists());
    }

    #[test]
    fn test_overwrites_existing_destination() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("tile.laz");
        std::fs::write(&dest, b"stale data from a previous run").unwrap();

        let body = b"fresh";
        let transport = ScriptedTransport::serving(body, 64);

        let summary = run_session(
            &transport,
            one_task(dir.path()),
            &DownloadConfig::default(),
            &AtomicBool::new(false),
            None,
        );

        assert_eq!(summary.succeeded(), 1);
        assert_eq!(std::fs::read(&dest).unwrap(), body.to_vec());
    }

    #[test]
    fn test_config_minimum_one_attempt() {
        let config = DownloadConfig::default().with_max_attempts(0);
        assert_eq!(config.max_attempts, 1);
    }

    #[test]
    fn test_empty_session_completes() {
        let transport = ScriptedTransport::serving(b"", 1);
        let summary = run_session(
            &transport,
            Vec::new(),
            &DownloadConfig::default(),
            &AtomicBool::new(false),
            None,
        );
        assert_eq!(summary.outcome, SessionOutcome::Completed);
        assert!(summary.all_succeeded());
    }
}
