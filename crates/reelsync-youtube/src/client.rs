//! Resumable upload client.

use std::path::Path;
use std::time::Duration;

use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
use reqwest::{Body, Client};
use tracing::{debug, info};

use reelsync_models::UploadRecord;

use crate::error::{YoutubeError, YoutubeResult};
use crate::types::{UploadedVideo, VideoId, VideoResource};

pub const DEFAULT_UPLOAD_BASE_URL: &str = "https://www.googleapis.com";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const FALLBACK_MIME: &str = "application/octet-stream";

/// YouTube client configuration.
#[derive(Debug, Clone)]
pub struct YoutubeConfig {
    /// Base URL the `/upload/youtube/v3/videos` path is appended to.
    pub upload_base_url: String,
    pub timeout: Option<Duration>,
}

impl Default for YoutubeConfig {
    fn default() -> Self {
        Self {
            upload_base_url: DEFAULT_UPLOAD_BASE_URL.to_string(),
            timeout: None,
        }
    }
}

impl YoutubeConfig {
    pub fn new(upload_base_url: impl Into<String>) -> Self {
        Self {
            upload_base_url: upload_base_url.into().trim_end_matches('/').to_string(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// YouTube Data API client bound to one access token.
pub struct YoutubeClient {
    http: Client,
    config: YoutubeConfig,
    access_token: String,
}

impl YoutubeClient {
    pub fn new(config: YoutubeConfig, access_token: impl Into<String>) -> YoutubeResult<Self> {
        let mut builder = Client::builder().connect_timeout(CONNECT_TIMEOUT);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| YoutubeError::ConfigError(e.to_string()))?;

        Ok(Self {
            http,
            config,
            access_token: access_token.into(),
        })
    }

    /// Upload one local video and return the id the service assigned.
    pub async fn upload_video(&self, path: &Path, record: &UploadRecord) -> YoutubeResult<VideoId> {
        let mime = mime_guess::from_path(path)
            .first_raw()
            .unwrap_or(FALLBACK_MIME);
        let length = tokio::fs::metadata(path).await?.len();

        let session = self.open_session(record, mime, length).await?;
        debug!(path = %path.display(), mime, length, "Opened upload session");

        let file = tokio::fs::File::open(path).await?;
        let response = self
            .http
            .put(&session)
            .bearer_auth(&self.access_token)
            .header(CONTENT_TYPE, mime)
            .header(CONTENT_LENGTH, length)
            .body(Body::from(file))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(YoutubeError::UploadFailed {
                status: status.as_u16(),
                body,
            });
        }

        let uploaded: UploadedVideo = response.json().await?;
        let id = uploaded
            .id
            .map(VideoId::from)
            .ok_or_else(|| YoutubeError::invalid_response("upload response carries no video id"))?;

        info!(video_id = %id, title = %record.title, "Video uploaded");
        Ok(id)
    }

    async fn open_session(
        &self,
        record: &UploadRecord,
        mime: &str,
        length: u64,
    ) -> YoutubeResult<String> {
        let url = format!("{}/upload/youtube/v3/videos", self.config.upload_base_url);
        let response = self
            .http
            .post(&url)
            .query(&[("uploadType", "resumable"), ("part", "snippet,status")])
            .bearer_auth(&self.access_token)
            .header("X-Upload-Content-Type", mime)
            .header("X-Upload-Content-Length", length)
            .json(&VideoResource::from(record))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(YoutubeError::SessionRejected {
                status: status.as_u16(),
                body,
            });
        }

        response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| YoutubeError::invalid_response("upload session has no Location header"))
    }
}
