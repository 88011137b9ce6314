//! OAuth token acquisition for the two services the pipeline talks to.
//!
//! This crate provides:
//! - A file-backed credential cache with atomic writes
//! - Authorization-code and refresh-token grants against a token endpoint
//! - Consent prompts (pasted code on stdin, or a loopback redirect listener)
//! - PKCE challenge generation
//! - Google installed-app client secrets loading

pub mod error;
pub mod manager;
pub mod pkce;
pub mod prompt;
pub mod provider;
pub mod secrets;
pub mod store;

pub use error::{AuthError, AuthResult};
pub use manager::{ProviderSource, RefreshPolicy, TokenGrant, TokenManager, TokenSource};
pub use pkce::Pkce;
pub use prompt::{AuthorizationGrant, ConsentPrompt, ConsentRequest, LoopbackPrompt, StdinPrompt};
pub use provider::{OAuthClient, OAuthProvider};
pub use secrets::ClientSecrets;
pub use store::CredentialStore;
