//! Pipeline configuration.

use std::path::PathBuf;
use std::time::Duration;

use reelsync_models::{ItemId, Privacy, UploadRecord};

use crate::error::{PipelineError, PipelineResult};

pub const DEFAULT_ACTION_LOG_FILE: &str = "actions.log";

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Microsoft application (client) id
    pub application_id: String,
    /// Microsoft application secret
    pub client_secret: String,
    pub graph_scopes: Vec<String>,
    pub graph_base_url: String,
    pub ms_authority: String,
    /// Redirect URI registered for the Microsoft app; the code is pasted back
    pub ms_redirect_uri: String,
    pub onedrive_token_file: PathBuf,
    /// Folder the walk starts from
    pub onedrive_root_id: ItemId,
    pub youtube_client_secrets_file: PathBuf,
    pub youtube_token_file: PathBuf,
    pub youtube_scopes: Vec<String>,
    pub youtube_upload_base_url: String,
    pub youtube_category_id: String,
    pub youtube_privacy: Privacy,
    /// Loopback port for the consent redirect (0 = ephemeral)
    pub youtube_redirect_port: u16,
    /// Staging directory for downloaded videos
    pub downloads_dir: PathBuf,
    pub action_log_file: PathBuf,
    /// Overall HTTP request timeout (None = no limit)
    pub http_timeout: Option<Duration>,
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> PipelineResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> PipelineResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| PipelineError::config(format!("{} is not set", key)))
        };

        let youtube_privacy = var("YOUTUBE_PRIVACY", "private")
            .parse::<Privacy>()
            .map_err(|e| PipelineError::config(e.to_string()))?;

        let youtube_redirect_port = var("YOUTUBE_REDIRECT_PORT", "0")
            .parse::<u16>()
            .map_err(|e| PipelineError::config(format!("YOUTUBE_REDIRECT_PORT: {}", e)))?;

        let http_timeout = match lookup("HTTP_TIMEOUT_SECS").filter(|v| !v.trim().is_empty()) {
            Some(raw) => Some(Duration::from_secs(raw.trim().parse().map_err(|e| {
                PipelineError::config(format!("HTTP_TIMEOUT_SECS: {}", e))
            })?)),
            None => None,
        };

        Ok(Self {
            application_id: required("APPLICATION_ID")?,
            client_secret: required("CLIENT_SECRET")?,
            graph_scopes: split_scopes(&var("GRAPH_SCOPES", "User.Read Files.ReadWrite.All")),
            graph_base_url: var("GRAPH_BASE_URL", "https://graph.microsoft.com/v1.0"),
            ms_authority: var("MS_AUTHORITY", "https://login.microsoftonline.com/consumers"),
            ms_redirect_uri: var(
                "MS_REDIRECT_URI",
                "https://login.microsoftonline.com/common/oauth2/nativeclient",
            ),
            onedrive_token_file: var("ONEDRIVE_TOKEN_FILE", "onedrive_token.json").into(),
            onedrive_root_id: ItemId::from(var("ONEDRIVE_ROOT_ID", ItemId::ROOT)),
            youtube_client_secrets_file: var("YOUTUBE_CLIENT_SECRETS_FILE", "client_secret.json")
                .into(),
            youtube_token_file: var("YOUTUBE_TOKEN_FILE", "youtube_token.json").into(),
            youtube_scopes: split_scopes(&var(
                "YOUTUBE_SCOPES",
                "https://www.googleapis.com/auth/youtube.upload",
            )),
            youtube_upload_base_url: var("YOUTUBE_UPLOAD_BASE_URL", "https://www.googleapis.com"),
            youtube_category_id: var("YOUTUBE_CATEGORY_ID", UploadRecord::DEFAULT_CATEGORY),
            youtube_privacy,
            youtube_redirect_port,
            downloads_dir: var("DOWNLOADS_DIR", "downloads").into(),
            action_log_file: var("ACTION_LOG_FILE", DEFAULT_ACTION_LOG_FILE).into(),
            http_timeout,
        })
    }
}

/// Scopes are separated by whitespace or commas.
fn split_scopes(raw: &str) -> Vec<String> {
    raw.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config =
            PipelineConfig::from_lookup(lookup(&[("APPLICATION_ID", "app"), ("CLIENT_SECRET", "s")]))
                .unwrap();

        assert_eq!(config.graph_scopes, vec!["User.Read", "Files.ReadWrite.All"]);
        assert_eq!(config.onedrive_root_id, ItemId::root());
        assert_eq!(config.onedrive_token_file, PathBuf::from("onedrive_token.json"));
        assert_eq!(config.youtube_token_file, PathBuf::from("youtube_token.json"));
        assert_eq!(config.youtube_category_id, "22");
        assert_eq!(config.youtube_privacy, Privacy::Private);
        assert_eq!(config.youtube_redirect_port, 0);
        assert_eq!(config.downloads_dir, PathBuf::from("downloads"));
        assert_eq!(config.action_log_file, PathBuf::from("actions.log"));
        assert!(config.http_timeout.is_none());
    }

    #[test]
    fn test_missing_required() {
        let err = PipelineConfig::from_lookup(lookup(&[("APPLICATION_ID", "app")])).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_overrides() {
        let config = PipelineConfig::from_lookup(lookup(&[
            ("APPLICATION_ID", "app"),
            ("CLIENT_SECRET", "s"),
            ("GRAPH_SCOPES", "User.Read,Files.Read offline_access"),
            ("YOUTUBE_PRIVACY", "Unlisted"),
            ("HTTP_TIMEOUT_SECS", "90"),
        ]))
        .unwrap();

        assert_eq!(
            config.graph_scopes,
            vec!["User.Read", "Files.Read", "offline_access"]
        );
        assert_eq!(config.youtube_privacy, Privacy::Unlisted);
        assert_eq!(config.http_timeout, Some(Duration::from_secs(90)));
    }

    #[test]
    fn test_invalid_values() {
        let base = [("APPLICATION_ID", "app"), ("CLIENT_SECRET", "s")];

        let mut pairs = base.to_vec();
        pairs.push(("YOUTUBE_PRIVACY", "friends-only"));
        assert!(PipelineConfig::from_lookup(lookup(&pairs)).is_err());

        let mut pairs = base.to_vec();
        pairs.push(("HTTP_TIMEOUT_SECS", "soon"));
        assert!(PipelineConfig::from_lookup(lookup(&pairs)).is_err());
    }

    #[test]
    #[serial]
    fn test_from_env() {
        std::env::set_var("APPLICATION_ID", "env-app");
        std::env::set_var("CLIENT_SECRET", "env-secret");
        std::env::set_var("DOWNLOADS_DIR", "/tmp/reelsync-staging");

        let config = PipelineConfig::from_env().unwrap();

        std::env::remove_var("APPLICATION_ID");
        std::env::remove_var("CLIENT_SECRET");
        std::env::remove_var("DOWNLOADS_DIR");

        assert_eq!(config.application_id, "env-app");
        assert_eq!(config.downloads_dir, PathBuf::from("/tmp/reelsync-staging"));
    }
}
