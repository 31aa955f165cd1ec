//! Progress reporting for download sessions.
//!
//! The engine invokes a caller-supplied callback after every chunk with
//! byte counters and an instantaneous transfer speed. The callback runs
//! on the worker thread, so it must be `Send + Sync` and cheap.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// A point-in-time progress report for one task.
#[derive(Debug, Clone, Copy)]
pub struct ProgressUpdate {
    /// Index of the task within the session.
    pub task_index: usize,
    /// Total number of tasks in the session.
    pub task_total: usize,
    /// Bytes written so far for this task.
    pub bytes_downloaded: u64,
    /// Expected size from the server, when known.
    pub total_bytes: Option<u64>,
    /// Instantaneous transfer speed in bytes per second.
    pub bytes_per_sec: f64,
}

/// Progress callback invoked from the download worker thread.
pub type ProgressCallback = Box<dyn Fn(ProgressUpdate) + Send + Sync>;

/// Default window over which instantaneous speed is measured.
const DEFAULT_SPEED_WINDOW: Duration = Duration::from_secs(2);

/// Computes instantaneous transfer speed over a short sliding window.
#[derive(Debug)]
pub struct SpeedTracker {
    window: Duration,
    samples: VecDeque<(Instant, u64)>,
}

impl SpeedTracker {
    /// Creates a tracker with the default 2 second window.
    pub fn new() -> Self {
        Self::with_window(DEFAULT_SPEED_WINDOW)
    }

    /// Creates a tracker with a custom window.
    pub fn with_window(window: Duration) -> Self {
        Self {
            window,
            samples: VecDeque::new(),
        }
    }

    /// Records the cumulative byte count at the current instant.
    pub fn record(&mut self, total_bytes: u64) {
        let now = Instant::now();
        self.samples.push_back((now, total_bytes));

        while let Some(&(t, _)) = self.samples.front() {
            // Keep at least two samples so a speed can always be derived.
            if self.samples.len() > 2 && now.duration_since(t) > self.window {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Instantaneous speed in bytes per second over the current window.
    ///
    /// Returns 0.0 until at least two samples have been recorded.
    pub fn bytes_per_sec(&self) -> f64 {
        let (Some(&(first_t, first_b)), Some(&(last_t, last_b))) =
            (self.samples.front(), self.samples.back())
        else {
            return 0.0;
        };

        let elapsed = last_t.duration_since(first_t).as_secs_f64();
        if elapsed <= 0.0 || last_b <= first_b {
            return 0.0;
        }
        (last_b - first_b) as f64 / elapsed
    }
}

impl Default for SpeedTracker {
    fn default() -> Self {
        Self::new()
    }
}
