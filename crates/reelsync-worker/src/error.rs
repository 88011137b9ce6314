//! Pipeline error types.

use thiserror::Error;

use reelsync_auth::AuthError;
use reelsync_models::Service;
use reelsync_youtube::YoutubeError;

use crate::logging::Action;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{service} authentication failed: {source}")]
    Authentication {
        service: &'static str,
        #[source]
        source: AuthError,
    },

    #[error("{0}")]
    RemoteListing(String),

    #[error("{0}")]
    Download(String),

    #[error("Upload failed: {0}")]
    Upload(#[from] YoutubeError),

    #[error("{0}")]
    Cleanup(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn authentication(service: Service, source: AuthError) -> Self {
        Self::Authentication {
            service: service.api_name(),
            source,
        }
    }

    pub fn remote_listing(msg: impl Into<String>) -> Self {
        Self::RemoteListing(msg.into())
    }

    pub fn download(msg: impl Into<String>) -> Self {
        Self::Download(msg.into())
    }

    pub fn cleanup(msg: impl Into<String>) -> Self {
        Self::Cleanup(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Fatal errors end the run; the others are logged and skipped.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Authentication { .. } | Self::Upload(_) | Self::Config(_) | Self::Io(_)
        )
    }

    /// Action-log category this error is recorded under.
    pub fn action(&self) -> Action {
        match self {
            Self::RemoteListing(_) => Action::FolderListingError,
            Self::Download(_) => Action::DownloadError,
            Self::Cleanup(_) => Action::CleanupError,
            _ => Action::Error,
        }
    }
}
