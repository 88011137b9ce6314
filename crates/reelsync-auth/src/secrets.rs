//! Google OAuth client secrets (`client_secret.json`).

use std::path::Path;

use serde::Deserialize;

use crate::error::{AuthError, AuthResult};

const GOOGLE_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Client registration downloaded from the Google Cloud console.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

fn default_auth_uri() -> String {
    GOOGLE_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

#[derive(Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    /// Parse the console JSON, accepting both "installed" and "web" clients.
    pub fn from_json(raw: &str) -> AuthResult<Self> {
        let file: ClientSecretsFile = serde_json::from_str(raw)
            .map_err(|e| AuthError::invalid_secrets(e.to_string()))?;

        file.installed.or(file.web).ok_or_else(|| {
            AuthError::invalid_secrets("expected an \"installed\" or \"web\" client section")
        })
    }

    pub async fn from_file(path: impl AsRef<Path>) -> AuthResult<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            AuthError::invalid_secrets(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_installed_client() {
        let secrets = ClientSecrets::from_json(
            r#"{"installed": {
                "client_id": "id.apps.googleusercontent.com",
                "client_secret": "shh",
                "redirect_uris": ["http://localhost"]
            }}"#,
        )
        .unwrap();

        assert_eq!(secrets.client_id, "id.apps.googleusercontent.com");
        assert_eq!(secrets.client_secret.as_deref(), Some("shh"));
        assert_eq!(secrets.auth_uri, GOOGLE_AUTH_URI);
        assert_eq!(secrets.token_uri, GOOGLE_TOKEN_URI);
    }

    #[test]
    fn test_web_client_with_custom_token_uri() {
        let secrets = ClientSecrets::from_json(
            r#"{"web": {"client_id": "abc", "token_uri": "http://localhost:9/token"}}"#,
        )
        .unwrap();
        assert_eq!(secrets.token_uri, "http://localhost:9/token");
        assert!(secrets.client_secret.is_none());
    }

    #[test]
    fn test_missing_section() {
        let err = ClientSecrets::from_json(r#"{"other": {}}"#).unwrap_err();
        assert!(matches!(err, AuthError::InvalidSecrets(_)));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let err = ClientSecrets::from_file("/nonexistent/client_secret.json")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidSecrets(_)));
    }
}
