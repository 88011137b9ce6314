//! Consent prompts.
//!
//! A prompt shows the consent URL to the user and returns the authorization
//! code the provider hands back. Two flavors exist: the user pastes the code
//! (or the whole redirected URL) on stdin, or a one-shot HTTP listener on the
//! loopback interface catches the redirect.

use std::future::IntoFuture;
use std::io::Write as _;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex};
use tracing::{debug, info};
use url::Url;
use uuid::Uuid;

use crate::error::{AuthError, AuthResult};
use crate::pkce::Pkce;
use crate::provider::OAuthClient;

/// How long the loopback listener may take to drain after the redirect.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Shows the consent URL to the user.
pub type UrlPresenter = Arc<dyn Fn(&str) + Send + Sync>;

fn present_in_console(url: &str) {
    info!("Waiting for the user to grant access in a browser");
    println!(
        "\nOpen the following URL in your browser to authorize access:\n\n    {}\n",
        url
    );
}

/// One pending consent round-trip.
pub struct ConsentRequest<'a> {
    client: &'a OAuthClient,
    pkce: &'a Pkce,
    state: String,
}

impl<'a> ConsentRequest<'a> {
    pub fn new(client: &'a OAuthClient, pkce: &'a Pkce) -> Self {
        Self {
            client,
            pkce,
            state: Uuid::new_v4().simple().to_string(),
        }
    }

    /// Anti-forgery value the redirect must echo back.
    pub fn state(&self) -> &str {
        &self.state
    }

    /// Consent URL for the given redirect URI.
    pub fn url_for(&self, redirect_uri: &str) -> AuthResult<String> {
        self.client
            .authorization_url(redirect_uri, &self.state, self.pkce)
    }
}

/// Code returned by the provider together with the redirect URI it was
/// issued for (the token exchange must repeat it).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationGrant {
    pub code: String,
    pub redirect_uri: String,
}

#[async_trait]
pub trait ConsentPrompt: Send + Sync {
    async fn obtain_code(&self, request: &ConsentRequest<'_>) -> AuthResult<AuthorizationGrant>;
}

/// Query parameters of an authorization redirect.
#[derive(Debug, Default, Deserialize)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

impl CallbackParams {
    fn from_url(url: &Url) -> Self {
        let mut params = Self::default();
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "code" => params.code = Some(value.into_owned()),
                "state" => params.state = Some(value.into_owned()),
                "error" => params.error = Some(value.into_owned()),
                "error_description" => params.error_description = Some(value.into_owned()),
                _ => {}
            }
        }
        params
    }

    fn is_callback(&self) -> bool {
        self.code.is_some() || self.error.is_some()
    }

    fn resolve(self, expected_state: &str) -> AuthResult<String> {
        if let Some(error) = self.error {
            return Err(AuthError::consent_denied(
                self.error_description.unwrap_or(error),
            ));
        }

        if self.state.as_deref() != Some(expected_state) {
            return Err(AuthError::authentication(
                "state mismatch in authorization redirect",
            ));
        }

        self.code
            .filter(|c| !c.is_empty())
            .ok_or_else(|| AuthError::consent_denied("redirect carried no authorization code"))
    }
}

/// Interpret what the user pasted: either the bare code or the full
/// redirected URL.
fn extract_code(input: &str, expected_state: &str) -> AuthResult<String> {
    let input = input.trim();
    if input.is_empty() {
        return Err(AuthError::consent_denied("no authorization code entered"));
    }

    match Url::parse(input) {
        Ok(url) if url.query().is_some() => CallbackParams::from_url(&url).resolve(expected_state),
        _ => Ok(input.to_string()),
    }
}

/// Prints the consent URL and reads the code from standard input.
pub struct StdinPrompt {
    redirect_uri: String,
    presenter: UrlPresenter,
}

impl StdinPrompt {
    pub fn new(redirect_uri: impl Into<String>) -> Self {
        Self {
            redirect_uri: redirect_uri.into(),
            presenter: Arc::new(present_in_console),
        }
    }

    pub fn with_presenter(mut self, presenter: UrlPresenter) -> Self {
        self.presenter = presenter;
        self
    }
}

#[async_trait]
impl ConsentPrompt for StdinPrompt {
    async fn obtain_code(&self, request: &ConsentRequest<'_>) -> AuthResult<AuthorizationGrant> {
        let url = request.url_for(&self.redirect_uri)?;
        (self.presenter)(&url);

        print!("Enter the authorization code: ");
        std::io::stdout().flush().ok();

        let mut line = String::new();
        BufReader::new(tokio::io::stdin())
            .read_line(&mut line)
            .await?;

        let code = extract_code(&line, request.state())?;
        Ok(AuthorizationGrant {
            code,
            redirect_uri: self.redirect_uri.clone(),
        })
    }
}

/// Catches the authorization redirect on `http://127.0.0.1:<port>/`.
///
/// Port 0 picks an ephemeral port; the provider must allow loopback
/// redirects on any port (Google installed-app clients do).
pub struct LoopbackPrompt {
    port: u16,
    presenter: UrlPresenter,
}

impl LoopbackPrompt {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            presenter: Arc::new(present_in_console),
        }
    }

    pub fn with_presenter(mut self, presenter: UrlPresenter) -> Self {
        self.presenter = presenter;
        self
    }
}

#[async_trait]
impl ConsentPrompt for LoopbackPrompt {
    async fn obtain_code(&self, request: &ConsentRequest<'_>) -> AuthResult<AuthorizationGrant> {
        let listener = TcpListener::bind(("127.0.0.1", self.port)).await?;
        let port = listener.local_addr()?.port();
        let redirect_uri = format!("http://127.0.0.1:{}/", port);
        let url = request.url_for(&redirect_uri)?;

        let (code_tx, code_rx) = oneshot::channel();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let app = redirect_router(request.state().to_string(), code_tx);
        let mut server = tokio::spawn(
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    stop_rx.await.ok();
                })
                .into_future(),
        );

        (self.presenter)(&url);
        debug!("Listening for authorization redirect on {}", redirect_uri);

        let received = code_rx.await.map_err(|_| {
            AuthError::authentication("loopback listener stopped before the redirect arrived")
        });

        stop_tx.send(()).ok();
        if tokio::time::timeout(SHUTDOWN_GRACE, &mut server).await.is_err() {
            debug!("Loopback listener did not drain in time, aborting it");
            server.abort();
        }

        let code = received??;
        Ok(AuthorizationGrant { code, redirect_uri })
    }
}

/// Handed to the redirect handler. The first callback takes the sender.
struct RedirectState {
    expected_state: String,
    sender: Mutex<Option<oneshot::Sender<AuthResult<String>>>>,
}

fn redirect_router(expected_state: String, sender: oneshot::Sender<AuthResult<String>>) -> Router {
    let state = Arc::new(RedirectState {
        expected_state,
        sender: Mutex::new(Some(sender)),
    });

    Router::new()
        .route("/", get(handle_redirect))
        .fallback(not_found)
        .with_state(state)
}

async fn handle_redirect(
    State(state): State<Arc<RedirectState>>,
    Query(params): Query<CallbackParams>,
) -> (StatusCode, &'static str) {
    if !params.is_callback() {
        return not_found().await;
    }

    let Some(sender) = state.sender.lock().await.take() else {
        return (StatusCode::GONE, "Authorization already received.");
    };

    let result = params.resolve(&state.expected_state);
    let page = if result.is_ok() {
        "Authorization complete. You may close this window."
    } else {
        "Authorization failed. Return to the terminal for details."
    };
    sender.send(result).ok();

    (StatusCode::OK, page)
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not found")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::OAuthProvider;
    use reqwest::Client;
    use std::collections::HashMap;

    fn client() -> OAuthClient {
        OAuthClient::new(
            OAuthProvider {
                client_id: "cid".to_string(),
                client_secret: None,
                authorize_url: "https://accounts.example.com/auth".to_string(),
                token_url: "https://accounts.example.com/token".to_string(),
                scopes: vec!["upload".to_string()],
                extra_authorize_params: vec![],
            },
            Client::new(),
        )
    }

    #[test]
    fn test_extract_bare_code() {
        assert_eq!(extract_code("  M.C507_abc \n", "s").unwrap(), "M.C507_abc");
    }

    #[test]
    fn test_extract_code_from_pasted_url() {
        let code = extract_code(
            "https://login.microsoftonline.com/common/oauth2/nativeclient?code=xyz&state=s1",
            "s1",
        )
        .unwrap();
        assert_eq!(code, "xyz");
    }

    #[test]
    fn test_extract_rejects_empty_and_errors() {
        assert!(matches!(
            extract_code("\n", "s"),
            Err(AuthError::ConsentDenied(_))
        ));
        assert!(matches!(
            extract_code(
                "http://localhost/?error=access_denied&error_description=User+declined",
                "s"
            ),
            Err(AuthError::ConsentDenied(msg)) if msg == "User declined"
        ));
    }

    #[test]
    fn test_state_mismatch() {
        let url = Url::parse("http://127.0.0.1:8080/?code=abc&state=other").unwrap();
        let params = CallbackParams::from_url(&url);
        assert!(matches!(
            params.resolve("expected"),
            Err(AuthError::Authentication(_))
        ));
    }

    #[test]
    fn test_non_callback_target() {
        let url = Url::parse("http://127.0.0.1:8080/favicon.ico").unwrap();
        let params = CallbackParams::from_url(&url);
        assert!(!params.is_callback());
    }

    #[tokio::test]
    async fn test_loopback_catches_redirect() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<String>();
        let prompt = LoopbackPrompt::new(0).with_presenter(Arc::new(move |url: &str| {
            tx.send(url.to_string()).ok();
        }));

        let client = client();
        let pkce = Pkce::generate();
        let request = ConsentRequest::new(&client, &pkce);
        let state = request.state().to_string();

        let browser = async {
            let consent_url = rx.recv().await.unwrap();
            let pairs: HashMap<String, String> = Url::parse(&consent_url)
                .unwrap()
                .query_pairs()
                .into_owned()
                .collect();
            let redirect = pairs["redirect_uri"].clone();

            let stray = reqwest::get(format!("{}favicon.ico", redirect)).await.unwrap();
            assert_eq!(stray.status(), 404);

            let callback = reqwest::get(format!("{}?code=granted&state={}", redirect, state))
                .await
                .unwrap();
            assert_eq!(callback.status(), 200);
            redirect
        };

        let (grant, redirect) = tokio::join!(prompt.obtain_code(&request), browser);
        let grant = grant.unwrap();

        assert_eq!(grant.code, "granted");
        assert_eq!(grant.redirect_uri, redirect);
        assert!(grant.redirect_uri.starts_with("http://127.0.0.1:"));
    }

    #[tokio::test]
    async fn test_loopback_reports_denied_consent() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<String>();
        let prompt = LoopbackPrompt::new(0).with_presenter(Arc::new(move |url: &str| {
            tx.send(url.to_string()).ok();
        }));

        let client = client();
        let pkce = Pkce::generate();
        let request = ConsentRequest::new(&client, &pkce);
        let state = request.state().to_string();

        let browser = async {
            let consent_url = rx.recv().await.unwrap();
            let redirect = Url::parse(&consent_url)
                .unwrap()
                .query_pairs()
                .find(|(k, _)| k == "redirect_uri")
                .map(|(_, v)| v.into_owned())
                .unwrap();

            let bare = reqwest::get(redirect.clone()).await.unwrap();
            assert_eq!(bare.status(), 404);

            let denied = reqwest::get(format!(
                "{}?error=access_denied&error_description=User+declined&state={}",
                redirect, state
            ))
            .await
            .unwrap();
            assert_eq!(denied.status(), 200);
            assert!(denied.text().await.unwrap().starts_with("Authorization failed"));
        };

        let (grant, ()) = tokio::join!(prompt.obtain_code(&request), browser);
        assert!(matches!(grant, Err(AuthError::ConsentDenied(msg)) if msg == "User declined"));
    }
}
