//! Microsoft Graph drive client.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::LOCATION;
use reqwest::{redirect, Client, Response, StatusCode};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use url::Url;

use reelsync_models::{ItemId, RemoteEntry};

use crate::error::{DriveError, DriveResult};
use crate::types::DriveItemPage;

pub const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";

/// Suffix of a download still in progress; renamed away once complete.
pub const PARTIAL_SUFFIX: &str = ".part";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Drive client configuration.
#[derive(Debug, Clone)]
pub struct DriveConfig {
    /// Graph API base URL (without trailing slash).
    pub base_url: String,
    /// Whole-request timeout; `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GRAPH_BASE_URL.to_string(),
            timeout: None,
        }
    }
}

impl DriveConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Remote drive operations used by the walker.
#[async_trait]
pub trait DriveApi: Send + Sync {
    /// List the immediate children of a folder.
    async fn list_children(&self, folder_id: &ItemId) -> DriveResult<Vec<RemoteEntry>>;

    /// Download a file's content to `destination`, returning bytes written.
    ///
    /// Nothing is left at `destination` when this fails.
    async fn download(&self, item_id: &ItemId, destination: &Path) -> DriveResult<u64>;
}

/// Graph API client bound to one access token.
pub struct DriveClient {
    /// Authenticated client; never follows redirects.
    api: Client,
    /// Unauthenticated client for pre-signed download locations.
    fetch: Client,
    config: DriveConfig,
    access_token: String,
}

impl DriveClient {
    pub fn new(config: DriveConfig, access_token: impl Into<String>) -> DriveResult<Self> {
        let mut api = Client::builder()
            .redirect(redirect::Policy::none())
            .connect_timeout(CONNECT_TIMEOUT);
        let mut fetch = Client::builder().connect_timeout(CONNECT_TIMEOUT);
        if let Some(timeout) = config.timeout {
            api = api.timeout(timeout);
            fetch = fetch.timeout(timeout);
        }

        let api = api
            .build()
            .map_err(|e| DriveError::ConfigError(e.to_string()))?;
        let fetch = fetch
            .build()
            .map_err(|e| DriveError::ConfigError(e.to_string()))?;

        Ok(Self {
            api,
            fetch,
            config,
            access_token: access_token.into(),
        })
    }

    fn item_url(&self, item_id: &ItemId, tail: &str) -> String {
        format!("{}/me/drive/items/{}/{}", self.config.base_url, item_id, tail)
    }

    async fn fetch_page(&self, url: &str, folder_id: &ItemId) -> DriveResult<DriveItemPage> {
        let response = self
            .api
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(DriveError::listing_failed(format!(
                "folder {} returned {}: {}",
                folder_id, status, body
            )));
        }

        Ok(response.json().await?)
    }

    fn redirect_target(request_url: &str, response: &Response) -> DriveResult<Option<Url>> {
        if !response.status().is_redirection() {
            return Ok(None);
        }
        let Some(location) = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
        else {
            return Ok(None);
        };
        Ok(Some(Url::parse(request_url)?.join(location)?))
    }
}

#[async_trait]
impl DriveApi for DriveClient {
    async fn list_children(&self, folder_id: &ItemId) -> DriveResult<Vec<RemoteEntry>> {
        let mut url = self.item_url(folder_id, "children");
        let mut entries = Vec::new();

        loop {
            let page = self.fetch_page(&url, folder_id).await?;
            entries.extend(page.value.into_iter().map(RemoteEntry::from));

            match page.next_link {
                Some(next) => url = next,
                None => break,
            }
        }

        debug!(folder_id = %folder_id, count = entries.len(), "Listed folder");
        Ok(entries)
    }

    async fn download(&self, item_id: &ItemId, destination: &Path) -> DriveResult<u64> {
        let url = self.item_url(item_id, "content");
        let response = self
            .api
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let Some(target) = Self::redirect_target(&url, &response)? else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DriveError::download_failed(format!(
                "Failed to download file with ID {}: {} {}",
                item_id, status, body
            )));
        };

        let response = self.fetch.get(target).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DriveError::download_failed(format!(
                "content location for {} returned {}",
                item_id, status
            )));
        }

        let temp = temp_path(destination);
        let written = match write_body(response, &temp).await {
            Ok(written) => written,
            Err(e) => {
                let _ = tokio::fs::remove_file(&temp).await;
                return Err(e);
            }
        };
        tokio::fs::rename(&temp, destination).await?;

        info!(
            item_id = %item_id,
            path = %destination.display(),
            bytes = written,
            "Downloaded file"
        );
        Ok(written)
    }
}

fn temp_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(PARTIAL_SUFFIX);
    destination.with_file_name(name)
}

async fn write_body(response: Response, path: &Path) -> DriveResult<u64> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut stream = response.bytes_stream();
    let mut written = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    Ok(written)
}
