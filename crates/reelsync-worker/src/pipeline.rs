//! The transfer pipeline.
//!
//! Stages run strictly in order, each awaited before the next:
//! `Init -> AuthStorage -> WalkAndDownload -> AuthHosting -> UploadAll -> Cleanup -> Done`.
//! The first fatal error ends the run; it is recorded once in the action log.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info};

use reelsync_auth::{
    ConsentPrompt, CredentialStore, LoopbackPrompt, OAuthProvider, ProviderSource, RefreshPolicy,
    StdinPrompt, TokenManager, TokenSource,
};
use reelsync_drive::{DriveClient, DriveConfig, TreeWalker, WalkReport};
use reelsync_models::{Service, UploadRecord};
use reelsync_youtube::{VideoId, YoutubeClient, YoutubeConfig};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::logging::{Action, ActionLog};
use crate::staging::{self, CleanupOutcome};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Init,
    AuthStorage,
    WalkAndDownload,
    AuthHosting,
    UploadAll,
    Cleanup,
    Done,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Init => "init",
            PipelineStage::AuthStorage => "auth_storage",
            PipelineStage::WalkAndDownload => "walk_and_download",
            PipelineStage::AuthHosting => "auth_hosting",
            PipelineStage::UploadAll => "upload_all",
            PipelineStage::Cleanup => "cleanup",
            PipelineStage::Done => "done",
        }
    }
}

/// What a completed run did.
#[derive(Debug, Clone, Default)]
pub struct PipelineSummary {
    pub walk: WalkReport,
    pub uploaded: Vec<VideoId>,
    pub cleanup: CleanupOutcome,
}

pub struct Pipeline {
    config: PipelineConfig,
    log: ActionLog,
    http: Client,
    storage_prompt: Arc<dyn ConsentPrompt>,
    hosting_prompt: Arc<dyn ConsentPrompt>,
}

impl Pipeline {
    /// Build a pipeline with console consent prompts: the storage side reads
    /// a pasted code, the hosting side catches its loopback redirect.
    pub fn new(config: PipelineConfig) -> PipelineResult<Self> {
        let mut builder = Client::builder().connect_timeout(CONNECT_TIMEOUT);
        if let Some(timeout) = config.http_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| PipelineError::config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            log: ActionLog::new(&config.action_log_file),
            storage_prompt: Arc::new(StdinPrompt::new(config.ms_redirect_uri.clone())),
            hosting_prompt: Arc::new(LoopbackPrompt::new(config.youtube_redirect_port)),
            http,
            config,
        })
    }

    pub fn with_prompts(
        mut self,
        storage: Arc<dyn ConsentPrompt>,
        hosting: Arc<dyn ConsentPrompt>,
    ) -> Self {
        self.storage_prompt = storage;
        self.hosting_prompt = hosting;
        self
    }

    /// Run every stage once.
    pub async fn run(&self) -> PipelineResult<PipelineSummary> {
        match self.execute().await {
            Ok(summary) => Ok(summary),
            Err(e) => {
                self.log.record(Action::Error, &format!("Error: {}", e));
                Err(e)
            }
        }
    }

    async fn execute(&self) -> PipelineResult<PipelineSummary> {
        let mut summary = PipelineSummary::default();

        self.enter(PipelineStage::Init);
        staging::ensure_dir(&self.config.downloads_dir).await?;

        self.enter(PipelineStage::AuthStorage);
        let storage_token = self.authenticate(&self.storage_tokens()).await?;

        self.enter(PipelineStage::WalkAndDownload);
        summary.walk = self.walk_and_download(storage_token).await?;

        self.enter(PipelineStage::AuthHosting);
        let hosting_token = self.authenticate(&self.hosting_tokens()).await?;

        self.enter(PipelineStage::UploadAll);
        summary.uploaded = self.upload_all(hosting_token).await?;

        self.enter(PipelineStage::Cleanup);
        summary.cleanup = self.cleanup().await;

        self.enter(PipelineStage::Done);
        info!(
            downloaded = summary.walk.videos_downloaded,
            uploaded = summary.uploaded.len(),
            removed = summary.cleanup.removed.len(),
            "Pipeline finished"
        );
        Ok(summary)
    }

    fn enter(&self, stage: PipelineStage) {
        debug!(stage = stage.as_str(), "Entering stage");
    }

    fn storage_tokens(&self) -> TokenManager {
        let provider = OAuthProvider::microsoft(
            &self.config.ms_authority,
            self.config.application_id.clone(),
            self.config.client_secret.clone(),
            self.config.graph_scopes.clone(),
        );

        TokenManager::new(
            Service::Storage,
            CredentialStore::new(&self.config.onedrive_token_file),
            ProviderSource::Ready(provider),
            self.storage_prompt.clone(),
            RefreshPolicy::ReuseCached,
            self.http.clone(),
        )
    }

    fn hosting_tokens(&self) -> TokenManager {
        TokenManager::new(
            Service::Hosting,
            CredentialStore::new(&self.config.youtube_token_file),
            ProviderSource::ClientSecretsFile {
                path: self.config.youtube_client_secrets_file.clone(),
                scopes: self.config.youtube_scopes.clone(),
            },
            self.hosting_prompt.clone(),
            RefreshPolicy::ValidateExpiry,
            self.http.clone(),
        )
    }

    async fn authenticate(&self, tokens: &TokenManager) -> PipelineResult<String> {
        let service = tokens.service();
        let grant = tokens
            .get_or_refresh()
            .await
            .map_err(|e| PipelineError::authentication(service, e))?;

        match grant.source {
            TokenSource::Authorized => self.log.record(
                Action::Authentication,
                &format!("{} token saved successfully", service.api_name()),
            ),
            TokenSource::Refreshed => self.log.record(
                Action::Authentication,
                &format!("{} token refreshed.", service.api_name()),
            ),
            TokenSource::Cached => debug!(service = %service, "Reusing cached token"),
        }

        Ok(grant.access_token)
    }

    async fn walk_and_download(&self, access_token: String) -> PipelineResult<WalkReport> {
        let drive_config =
            DriveConfig::new(&self.config.graph_base_url).with_timeout(self.config.http_timeout);
        let drive = DriveClient::new(drive_config, access_token)
            .map_err(|e| PipelineError::config(e.to_string()))?;

        let report = TreeWalker::new(&drive, &self.config.downloads_dir)
            .with_observer(&self.log)
            .walk(&self.config.onedrive_root_id)
            .await;

        if !report.found_any_video() {
            self.log
                .record(Action::Download, "No video files found in OneDrive.");
        }

        Ok(report)
    }

    async fn upload_all(&self, access_token: String) -> PipelineResult<Vec<VideoId>> {
        let dir = &self.config.downloads_dir;
        if !staging::exists(dir).await {
            self.log.record(
                Action::Error,
                &format!("The '{}' folder does not exist.", dir.display()),
            );
            return Ok(Vec::new());
        }

        let youtube_config = YoutubeConfig::new(&self.config.youtube_upload_base_url)
            .with_timeout(self.config.http_timeout);
        let youtube = YoutubeClient::new(youtube_config, access_token)?;

        let mut uploaded = Vec::new();
        for path in staging::staged_files(dir).await? {
            let Some(record) = UploadRecord::for_staged_file(
                &path,
                &self.config.youtube_category_id,
                self.config.youtube_privacy,
            ) else {
                continue;
            };

            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            self.log
                .record(Action::UploadStart, &format!("Uploading video: {}", file_name));

            let id = youtube.upload_video(&path, &record).await?;
            self.log
                .record(Action::Upload, &format!("Video uploaded successfully: {}", id));
            uploaded.push(id);
        }

        Ok(uploaded)
    }

    async fn cleanup(&self) -> CleanupOutcome {
        self.report_cleanup(staging::clear(&self.config.downloads_dir).await)
    }

    /// Log what cleanup did. Failures are recorded but never end the run.
    fn report_cleanup(&self, result: io::Result<CleanupOutcome>) -> CleanupOutcome {
        match result {
            Ok(outcome) => {
                for (path, reason) in &outcome.failures {
                    self.log.record_error(&PipelineError::cleanup(format!(
                        "Failed to delete {}: {}",
                        path.display(),
                        reason
                    )));
                }
                self.log
                    .record(Action::Cleanup, "Downloads folder cleaned up successfully.");
                outcome
            }
            Err(e) => {
                self.log
                    .record(Action::Error, &format!("Error cleaning up the folder: {}", e));
                CleanupOutcome::default()
            }
        }
    }
}
