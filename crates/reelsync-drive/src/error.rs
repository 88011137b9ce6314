//! Drive error types.

use thiserror::Error;

/// Result type for drive operations.
pub type DriveResult<T> = Result<T, DriveError>;

/// Errors that can occur while talking to the drive.
#[derive(Debug, Error)]
pub enum DriveError {
    #[error("Failed to configure drive client: {0}")]
    ConfigError(String),

    #[error("Folder listing failed: {0}")]
    ListingFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DriveError {
    pub fn listing_failed(msg: impl Into<String>) -> Self {
        Self::ListingFailed(msg.into())
    }

    pub fn download_failed(msg: impl Into<String>) -> Self {
        Self::DownloadFailed(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }
}
