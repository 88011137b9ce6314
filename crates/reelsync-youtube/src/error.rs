//! YouTube error types.

use thiserror::Error;

/// Result type for YouTube operations.
pub type YoutubeResult<T> = Result<T, YoutubeError>;

/// Errors that can occur while uploading.
#[derive(Debug, Error)]
pub enum YoutubeError {
    #[error("Failed to configure YouTube client: {0}")]
    ConfigError(String),

    #[error("Upload session rejected: {status} {body}")]
    SessionRejected { status: u16, body: String },

    #[error("Upload failed: {status} {body}")]
    UploadFailed { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl YoutubeError {
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_status_and_body() {
        let quota = YoutubeError::SessionRejected {
            status: 403,
            body: "quotaExceeded".into(),
        };
        assert_eq!(quota.to_string(), "Upload session rejected: 403 quotaExceeded");
        assert_eq!(
            YoutubeError::invalid_response("no id").to_string(),
            "Invalid response: no id"
        );
    }
}
