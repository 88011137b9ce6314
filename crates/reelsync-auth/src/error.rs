//! Authentication error types.

use thiserror::Error;

/// Result type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;

/// Errors that can occur while acquiring or persisting tokens.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Failed to acquire access token: {0}")]
    Authentication(String),

    #[error("Consent was not granted: {0}")]
    ConsentDenied(String),

    #[error("Invalid client secrets: {0}")]
    InvalidSecrets(String),

    #[error("Token store error: {0}")]
    Store(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AuthError {
    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    pub fn consent_denied(msg: impl Into<String>) -> Self {
        Self::ConsentDenied(msg.into())
    }

    pub fn invalid_secrets(msg: impl Into<String>) -> Self {
        Self::InvalidSecrets(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }
}
