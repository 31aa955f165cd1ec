//! CLI error type and exit codes.

use std::io;
use std::path::PathBuf;

use aoi2list::aoi::AoiError;
use aoi2list::catalog::CatalogError;
use aoi2list::downloader::DownloadError;

/// Errors surfaced to the user by the CLI.
#[derive(Debug)]
pub enum CliError {
    /// Invalid AOI parameters; rejected before any network call.
    Aoi(AoiError),

    /// The catalog query failed.
    Catalog(CatalogError),

    /// The download session could not be started.
    Download(DownloadError),

    /// One or more files failed to download.
    DownloadsFailed { failed: usize, total: usize },

    /// Writing the URL list failed.
    ListWrite { path: PathBuf, source: io::Error },
}

impl CliError {
    /// Process exit code for this error.
    ///
    /// 1 for invalid input, 2 for query failures, 3 for download
    /// failures.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Aoi(_) | Self::ListWrite { .. } => 1,
            Self::Catalog(_) => 2,
            Self::Download(_) | Self::DownloadsFailed { .. } => 3,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Aoi(e) => write!(f, "invalid area of interest: {}", e),
            Self::Catalog(e) => write!(f, "ScienceBase query failed: {}", e),
            Self::Download(e) => write!(f, "could not start download: {}", e),
            Self::DownloadsFailed { failed, total } => {
                write!(f, "{} of {} downloads failed", failed, total)
            }
            Self::ListWrite { path, source } => {
                write!(
                    f,
                    "could not write URL list to {}: {}",
                    path.display(),
                    source
                )
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Aoi(e) => Some(e),
            Self::Catalog(e) => Some(e),
            Self::Download(e) => Some(e),
            Self::ListWrite { source, .. } => Some(source),
            Self::DownloadsFailed { .. } => None,
        }
    }
}

impl From<AoiError> for CliError {
    fn from(e: AoiError) -> Self {
        Self::Aoi(e)
    }
}

impl From<CatalogError> for CliError {
    fn from(e: CatalogError) -> Self {
        Self::Catalog(e)
    }
}

impl From<DownloadError> for CliError {
    fn from(e: DownloadError) -> Self {
        Self::Download(e)
    }
}
