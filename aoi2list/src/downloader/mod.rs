//! Download engine for LAZ files
//!
//! Streams selected URLs to disk on a background worker thread, with:
//!
//! - byte-level progress callbacks including instantaneous speed
//! - retries of transient failures with a fixed attempt limit
//! - cooperative cancellation via a shared flag, leaving no partial
//!   files behind
//!
//! Tasks run strictly sequentially within a session; a failed task does
//! not stop the session, and the final [`SessionSummary`] reports the
//! succeeded/failed/cancelled split.

mod engine;
mod error;
mod progress;
mod session;
mod task;
mod transport;

pub use engine::{run_session, DownloadConfig, SessionOutcome, SessionSummary};
pub use error::DownloadError;
pub use progress::{ProgressCallback, ProgressUpdate, SpeedTracker};
pub use session::DownloadSession;
pub use task::{DownloadTask, TaskStatus};
pub use transport::{ReqwestTransport, Transport};
