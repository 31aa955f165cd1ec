//! HTTP client abstraction for catalog queries

use super::CatalogError;

/// Trait for the HTTP GET used by catalog queries.
///
/// This abstraction allows for dependency injection and easier testing
/// by enabling mock HTTP clients in tests.
pub trait HttpClient: Send + Sync {
    /// Performs an HTTP GET request with query parameters.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to request
    /// * `query` - Query string parameters to append
    ///
    /// # Returns
    ///
    /// The response body as bytes or an error.
    fn get(&self, url: &str, query: &[(&str, String)]) -> Result<Vec<u8>, CatalogError>;
}

/// Real HTTP client implementation using reqwest.
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// Creates a new ReqwestClient with a 30 second timeout.
    pub fn new() -> Result<Self, CatalogError> {
        Self::with_timeout(std::time::Duration::from_secs(30))
    }

    /// Creates a new ReqwestClient with a custom timeout.
    pub fn with_timeout(timeout: std::time::Duration) -> Result<Self, CatalogError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CatalogError::Http {
                url: String::new(),
                reason: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str, query: &[(&str, String)]) -> Result<Vec<u8>, CatalogError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .map_err(|e| CatalogError::Http {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| CatalogError::Http {
                url: url.to_string(),
                reason: format!("failed to read response body: {}", e),
            })
    }
}
