//! Background download session.
//!
//! A [`DownloadSession`] runs the engine on a single worker thread so the
//! presentation layer stays responsive. The caller and the worker share a
//! cancellation flag (written by the caller, read by the worker) and a
//! progress callback; nothing else is synchronized.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use super::engine::{run_session, DownloadConfig, SessionSummary};
use super::error::DownloadError;
use super::progress::ProgressCallback;
use super::task::DownloadTask;
use super::transport::{ReqwestTransport, Transport};

/// A download session running on a background worker thread.
pub struct DownloadSession {
    handle: JoinHandle<SessionSummary>,
    cancel: Arc<AtomicBool>,
}

impl DownloadSession {
    /// Starts a session over HTTP.
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be constructed; no thread is
    /// spawned in that case.
    pub fn start(
        tasks: Vec<DownloadTask>,
        config: DownloadConfig,
        on_progress: Option<ProgressCallback>,
    ) -> Result<Self, DownloadError> {
        let transport = ReqwestTransport::with_timeout(config.timeout)?;
        Ok(Self::start_with_transport(
            transport,
            tasks,
            config,
            on_progress,
        ))
    }

    /// Starts a session over a custom transport.
    pub fn start_with_transport<T: Transport + 'static>(
        transport: T,
        tasks: Vec<DownloadTask>,
        config: DownloadConfig,
        on_progress: Option<ProgressCallback>,
    ) -> Self {
        let cancel = Arc::new(AtomicBool::new(false));
        let worker_cancel = Arc::clone(&cancel);

        let handle = thread::spawn(move || {
            run_session(
                &transport,
                tasks,
                &config,
                &worker_cancel,
                on_progress.as_ref(),
            )
        });

        Self { handle, cancel }
    }

    /// Requests cooperative cancellation.
    ///
    /// The worker observes the flag between chunks; already-completed
    /// files are left in place and the in-flight partial file is removed.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// Shared handle to the cancellation flag, e.g. for a Ctrl-C handler.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Blocks until the worker finishes and returns the final summary.
    ///
    /// # Panics
    ///
    /// Panics if the worker thread panicked; the engine itself never
    /// panics on I/O or network failures, so this indicates a bug.
    pub fn wait(self) -> SessionSummary {
        self.handle
            .join()
            .expect("download worker thread panicked")
    }
}
