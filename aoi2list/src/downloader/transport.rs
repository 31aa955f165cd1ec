//! Streaming HTTP transport for the download engine.
//!
//! The engine is generic over [`Transport`] so tests can script failures
//! and chunk boundaries without a network.

use std::io::Read;
use std::time::Duration;

use super::error::DownloadError;

/// Default timeout for download requests.
pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300); // 5 minutes

/// A source of streamed file bodies.
pub trait Transport: Send + Sync {
    /// Queries the file size, typically via a HEAD request.
    ///
    /// Returns `None` when the size cannot be determined; the download
    /// proceeds without a known total.
    fn content_length(&self, url: &str) -> Option<u64>;

    /// Opens a streamed GET for the given URL.
    fn open(&self, url: &str) -> Result<Box<dyn Read + Send>, DownloadError>;
}

/// Real transport backed by a blocking reqwest client.
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Creates a transport with the default 5 minute timeout.
    pub fn new() -> Result<Self, DownloadError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Creates a transport with a custom timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, DownloadError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DownloadError::Client(e.to_string()))?;

        Ok(Self { client, timeout })
    }
}

impl Transport for ReqwestTransport {
    fn content_length(&self, url: &str) -> Option<u64> {
        self.client
            .head(url)
            .send()
            .ok()
            .filter(|r| r.status().is_success())
            .and_then(|r| {
                r.headers()
                    .get("content-length")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
            })
    }

    fn open(&self, url: &str) -> Result<Box<dyn Read + Send>, DownloadError> {
        let response = self.client.get(url).send().map_err(|e| {
            if e.is_timeout() {
                DownloadError::Timeout {
                    url: url.to_string(),
                    timeout_secs: self.timeout.as_secs(),
                }
            } else {
                DownloadError::Request {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(Box::new(response))
    }
}
