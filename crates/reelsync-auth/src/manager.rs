//! Token acquisition for one service.
//!
//! Order of attempts:
//! - cached record (policy decides whether expiry is checked)
//! - silent refresh with the stored refresh token
//! - interactive consent, then the authorization-code grant
//!
//! Whatever is obtained from the provider is persisted before it is returned.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Duration, Utc};
use reqwest::Client;
use tracing::{debug, info, warn};

use reelsync_models::{CredentialRecord, Service};

use crate::error::{AuthError, AuthResult};
use crate::pkce::Pkce;
use crate::prompt::{ConsentPrompt, ConsentRequest};
use crate::provider::{OAuthClient, OAuthProvider};
use crate::secrets::ClientSecrets;
use crate::store::CredentialStore;

/// A cached token is only trusted if it outlives now by this many seconds.
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

/// How much a cached record is trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPolicy {
    /// Any cached access token is returned as-is, expired or not. A stale
    /// token surfaces later as a failed API call.
    ReuseCached,
    /// A cached token is returned only while valid; otherwise refresh, then
    /// fall back to consent.
    ValidateExpiry,
}

/// Where the provider registration comes from.
#[derive(Debug, Clone)]
pub enum ProviderSource {
    Ready(OAuthProvider),
    /// Google client secrets file, read only when the provider is actually
    /// contacted (a valid cached token needs no secrets).
    ClientSecretsFile { path: PathBuf, scopes: Vec<String> },
}

impl ProviderSource {
    async fn resolve(&self) -> AuthResult<OAuthProvider> {
        match self {
            ProviderSource::Ready(provider) => Ok(provider.clone()),
            ProviderSource::ClientSecretsFile { path, scopes } => {
                let secrets = ClientSecrets::from_file(path).await?;
                Ok(OAuthProvider::google(&secrets, scopes.clone()))
            }
        }
    }
}

/// How the returned token was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Cached,
    Refreshed,
    Authorized,
}

/// A usable access token.
#[derive(Debug, Clone)]
pub struct TokenGrant {
    pub access_token: String,
    pub source: TokenSource,
}

/// Obtains access tokens for one service.
pub struct TokenManager {
    service: Service,
    store: CredentialStore,
    provider: ProviderSource,
    prompt: Arc<dyn ConsentPrompt>,
    policy: RefreshPolicy,
    http: Client,
}

impl TokenManager {
    pub fn new(
        service: Service,
        store: CredentialStore,
        provider: ProviderSource,
        prompt: Arc<dyn ConsentPrompt>,
        policy: RefreshPolicy,
        http: Client,
    ) -> Self {
        Self {
            service,
            store,
            provider,
            prompt,
            policy,
            http,
        }
    }

    pub fn service(&self) -> Service {
        self.service
    }

    /// Return a usable access token, refreshing or re-authorizing as needed.
    ///
    /// Fails with [`AuthError::Authentication`] (or a more specific variant)
    /// when no token could be obtained; callers treat that as fatal.
    pub async fn get_or_refresh(&self) -> AuthResult<TokenGrant> {
        let cached = self.load_cached().await;

        if let Some(record) = &cached {
            if self.is_trusted(record) {
                debug!(service = %self.service, "Using cached access token");
                return Ok(TokenGrant {
                    access_token: record.access_token.clone(),
                    source: TokenSource::Cached,
                });
            }

            if self.policy == RefreshPolicy::ValidateExpiry && record.can_refresh() {
                match self.refresh(record).await {
                    Ok(grant) => return Ok(grant),
                    Err(e) => warn!(
                        service = %self.service,
                        "Token refresh failed, falling back to consent: {}", e
                    ),
                }
            }
        }

        self.authorize().await
    }

    fn is_trusted(&self, record: &CredentialRecord) -> bool {
        match self.policy {
            RefreshPolicy::ReuseCached => record.has_access_token(),
            RefreshPolicy::ValidateExpiry => {
                record.is_valid_at(Utc::now(), Duration::seconds(TOKEN_REFRESH_MARGIN_SECS))
            }
        }
    }

    /// Load the cached record; a corrupt file counts as no record.
    async fn load_cached(&self) -> Option<CredentialRecord> {
        match self.store.load().await {
            Ok(record) => record,
            Err(e) => {
                warn!(service = %self.service, "Error loading token file: {}", e);
                None
            }
        }
    }

    async fn client(&self) -> AuthResult<OAuthClient> {
        let provider = self.provider.resolve().await?;
        Ok(OAuthClient::new(provider, self.http.clone()))
    }

    async fn refresh(&self, record: &CredentialRecord) -> AuthResult<TokenGrant> {
        let refresh_token = record
            .refresh_token
            .as_deref()
            .ok_or_else(|| AuthError::authentication("no refresh token stored"))?;

        let client = self.client().await?;
        let refreshed = client.refresh(refresh_token).await?;
        self.store.save(&refreshed).await?;

        info!(service = %self.service, "Access token refreshed");
        Ok(TokenGrant {
            access_token: refreshed.access_token,
            source: TokenSource::Refreshed,
        })
    }

    async fn authorize(&self) -> AuthResult<TokenGrant> {
        let client = self.client().await?;
        let pkce = Pkce::generate();
        let request = ConsentRequest::new(&client, &pkce);

        info!(service = %self.service, "Interactive authorization required");
        let grant = self.prompt.obtain_code(&request).await?;

        let record = client
            .exchange_code(&grant.code, &grant.redirect_uri, &pkce)
            .await?;
        if !record.has_access_token() {
            return Err(AuthError::authentication("token endpoint returned an empty access token"));
        }
        self.store.save(&record).await?;

        info!(
            service = %self.service,
            path = %self.store.path().display(),
            "Access token saved"
        );
        Ok(TokenGrant {
            access_token: record.access_token,
            source: TokenSource::Authorized,
        })
    }
}
