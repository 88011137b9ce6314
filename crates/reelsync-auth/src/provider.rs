//! OAuth 2.0 authorization-code and refresh-token grants.

use chrono::{Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use reelsync_models::CredentialRecord;

use crate::error::{AuthError, AuthResult};
use crate::pkce::Pkce;
use crate::secrets::ClientSecrets;

/// Static description of an identity provider and our client registration.
#[derive(Debug, Clone)]
pub struct OAuthProvider {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub authorize_url: String,
    pub token_url: String,
    pub scopes: Vec<String>,
    /// Extra query parameters appended to the consent URL.
    pub extra_authorize_params: Vec<(String, String)>,
}

impl OAuthProvider {
    /// Microsoft identity platform (v2 endpoints) under the given authority,
    /// e.g. `https://login.microsoftonline.com/consumers`.
    pub fn microsoft(
        authority: &str,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        scopes: Vec<String>,
    ) -> Self {
        let authority = authority.trim_end_matches('/');
        Self {
            client_id: client_id.into(),
            client_secret: Some(client_secret.into()),
            authorize_url: format!("{}/oauth2/v2.0/authorize", authority),
            token_url: format!("{}/oauth2/v2.0/token", authority),
            scopes,
            extra_authorize_params: vec![],
        }
    }

    /// Google installed-app client. Requests offline access so a refresh
    /// token is issued.
    pub fn google(secrets: &ClientSecrets, scopes: Vec<String>) -> Self {
        Self {
            client_id: secrets.client_id.clone(),
            client_secret: secrets.client_secret.clone(),
            authorize_url: secrets.auth_uri.clone(),
            token_url: secrets.token_uri.clone(),
            scopes,
            extra_authorize_params: vec![
                ("access_type".to_string(), "offline".to_string()),
                ("prompt".to_string(), "consent".to_string()),
            ],
        }
    }
}

/// Raw token endpoint answer, success or error.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    scope: Option<String>,
    token_type: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// HTTP client bound to one provider.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    http: Client,
    provider: OAuthProvider,
}

impl OAuthClient {
    pub fn new(provider: OAuthProvider, http: Client) -> Self {
        Self { http, provider }
    }

    /// Build the consent URL the user has to visit.
    pub fn authorization_url(
        &self,
        redirect_uri: &str,
        state: &str,
        pkce: &Pkce,
    ) -> AuthResult<String> {
        let scope = self.provider.scopes.join(" ");
        let mut url = Url::parse(&self.provider.authorize_url)?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("client_id", &self.provider.client_id)
                .append_pair("response_type", "code")
                .append_pair("redirect_uri", redirect_uri)
                .append_pair("scope", &scope)
                .append_pair("state", state)
                .append_pair("code_challenge", &pkce.challenge)
                .append_pair("code_challenge_method", Pkce::METHOD);
            for (key, value) in &self.provider.extra_authorize_params {
                query.append_pair(key, value);
            }
        }
        Ok(url.into())
    }

    /// Exchange an authorization code for a credential record.
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
        pkce: &Pkce,
    ) -> AuthResult<CredentialRecord> {
        let scope = self.provider.scopes.join(" ");
        let form = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("code_verifier", pkce.verifier.as_str()),
            ("scope", scope.as_str()),
        ];
        self.request_token(form, None).await
    }

    /// Redeem a refresh token.
    ///
    /// Providers may omit the refresh token from the answer; the one that was
    /// redeemed is carried over in that case.
    pub async fn refresh(&self, refresh_token: &str) -> AuthResult<CredentialRecord> {
        let form = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];
        self.request_token(form, Some(refresh_token)).await
    }

    async fn request_token(
        &self,
        form: Vec<(&str, &str)>,
        previous_refresh_token: Option<&str>,
    ) -> AuthResult<CredentialRecord> {
        let mut params: Vec<(&str, &str)> = form.iter().copied().collect();
        params.push(("client_id", self.provider.client_id.as_str()));
        if let Some(secret) = self.provider.client_secret.as_deref() {
            params.push(("client_secret", secret));
        }

        debug!("Requesting token from {}", self.provider.token_url);

        let response = self
            .http
            .post(&self.provider.token_url)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let parsed: Option<TokenResponse> = serde_json::from_str(&body).ok();

        let token = match parsed {
            Some(token) if status.is_success() && token.access_token.is_some() => token,
            Some(token) => {
                let reason = token
                    .error_description
                    .or(token.error)
                    .unwrap_or_else(|| format!("token endpoint returned {}", status));
                warn!("Token request rejected ({}): {}", status, reason);
                return Err(AuthError::authentication(reason));
            }
            None => {
                warn!("Token endpoint returned unparseable body ({})", status);
                return Err(AuthError::authentication(format!(
                    "token endpoint returned {}: {}",
                    status, body
                )));
            }
        };

        Ok(self.build_record(token, previous_refresh_token))
    }

    fn build_record(
        &self,
        token: TokenResponse,
        previous_refresh_token: Option<&str>,
    ) -> CredentialRecord {
        let scopes = token
            .scope
            .map(|s| s.split_whitespace().map(str::to_string).collect())
            .unwrap_or_else(|| self.provider.scopes.clone());

        CredentialRecord {
            access_token: token.access_token.unwrap_or_default(),
            refresh_token: token
                .refresh_token
                .or_else(|| previous_refresh_token.map(str::to_string)),
            expires_at: token
                .expires_in
                .map(|secs| Utc::now() + Duration::seconds(secs)),
            scopes,
            token_type: token.token_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(token_url: String) -> OAuthProvider {
        OAuthProvider {
            client_id: "client-id".to_string(),
            client_secret: Some("client-secret".to_string()),
            authorize_url: "https://login.example.com/authorize".to_string(),
            token_url,
            scopes: vec!["User.Read".to_string(), "Files.ReadWrite.All".to_string()],
            extra_authorize_params: vec![],
        }
    }

    #[test]
    fn test_microsoft_endpoints() {
        let p = OAuthProvider::microsoft(
            "https://login.microsoftonline.com/consumers/",
            "app",
            "secret",
            vec!["User.Read".to_string()],
        );
        assert_eq!(
            p.authorize_url,
            "https://login.microsoftonline.com/consumers/oauth2/v2.0/authorize"
        );
        assert_eq!(
            p.token_url,
            "https://login.microsoftonline.com/consumers/oauth2/v2.0/token"
        );
    }

    #[test]
    fn test_google_requests_offline_access() {
        let secrets = ClientSecrets::from_json(r#"{"installed": {"client_id": "g"}}"#).unwrap();
        let client = OAuthClient::new(
            OAuthProvider::google(&secrets, vec!["scope-a".to_string()]),
            Client::new(),
        );
        let url = client
            .authorization_url("http://127.0.0.1:5000/", "xyz", &Pkce::generate())
            .unwrap();
        assert!(url.starts_with("https://accounts.google.com/o/oauth2/auth?"));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains("prompt=consent"));
    }

    #[test]
    fn test_authorization_url_params() {
        let client = OAuthClient::new(provider("http://unused".to_string()), Client::new());
        let pkce = Pkce::from_verifier("verifier-verifier-verifier-verifier-verifier");
        let url = Url::parse(
            &client
                .authorization_url("http://localhost/cb", "state-1", &pkce)
                .unwrap(),
        )
        .unwrap();

        let pairs: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs["client_id"], "client-id");
        assert_eq!(pairs["response_type"], "code");
        assert_eq!(pairs["redirect_uri"], "http://localhost/cb");
        assert_eq!(pairs["scope"], "User.Read Files.ReadWrite.All");
        assert_eq!(pairs["state"], "state-1");
        assert_eq!(pairs["code_challenge"], pkce.challenge);
        assert_eq!(pairs["code_challenge_method"], "S256");
    }

    #[tokio::test]
    async fn test_exchange_code_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=the-code"))
            .and(body_string_contains("client_secret=client-secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "at",
                "refresh_token": "rt",
                "expires_in": 3600,
                "scope": "User.Read Files.ReadWrite.All",
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OAuthClient::new(provider(format!("{}/token", server.uri())), Client::new());
        let record = client
            .exchange_code("the-code", "http://localhost/cb", &Pkce::generate())
            .await
            .unwrap();

        assert_eq!(record.access_token, "at");
        assert_eq!(record.refresh_token.as_deref(), Some("rt"));
        assert_eq!(record.scopes.len(), 2);
        assert!(record.expires_at.unwrap() > Utc::now());
    }

    #[tokio::test]
    async fn test_exchange_code_error_description() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant",
                "error_description": "AADSTS70000: The code has expired."
            })))
            .mount(&server)
            .await;

        let client = OAuthClient::new(provider(format!("{}/token", server.uri())), Client::new());
        let err = client
            .exchange_code("stale", "http://localhost/cb", &Pkce::generate())
            .await
            .unwrap_err();

        match err {
            AuthError::Authentication(msg) => assert!(msg.contains("AADSTS70000")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_refresh_keeps_previous_refresh_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "fresh",
                "expires_in": 3599
            })))
            .mount(&server)
            .await;

        let client = OAuthClient::new(provider(format!("{}/token", server.uri())), Client::new());
        let record = client.refresh("old-refresh").await.unwrap();

        assert_eq!(record.access_token, "fresh");
        assert_eq!(record.refresh_token.as_deref(), Some("old-refresh"));
        assert_eq!(record.scopes, vec!["User.Read", "Files.ReadWrite.All"]);
    }

    #[tokio::test]
    async fn test_success_status_without_token_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = OAuthClient::new(provider(format!("{}/token", server.uri())), Client::new());
        let err = client.refresh("rt").await.unwrap_err();
        assert!(matches!(err, AuthError::Authentication(_)));
    }
}
