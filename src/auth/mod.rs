//! # Authentication
//!
//! Adapters over an identity provider. The rest of the crate only sees
//! [`AuthAdapter`]: a status snapshot, a login flow, and an access-token
//! accessor that degrades to `None` instead of failing.
//!
//! ```text
//! AuthAdapter
//! ├── DisabledAuth      // provider not configured, always anonymous
//! ├── StaticTokenAuth   // pre-issued bearer token (LEXI_ACCESS_TOKEN)
//! └── Auth0Auth         // device authorization flow + refresh, cached on disk
//! ```

pub mod auth0;
pub mod credentials;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::core::config::ResolvedConfig;
pub use auth0::Auth0Auth;
pub use credentials::CredentialStore;

/// User details as reported by the identity provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

impl Profile {
    /// Best label for the header: name, then email, then a placeholder.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or("Signed in")
    }
}

/// Snapshot of the authentication status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub user: Option<Profile>,
}

/// What the user has to do to finish a device login.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeviceCode {
    pub device_code: String,
    pub user_code: String,
    pub verification_uri: String,
    #[serde(default)]
    pub verification_uri_complete: Option<String>,
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
    #[serde(default = "default_interval")]
    pub interval: u64,
}

fn default_expires_in() -> u64 {
    900
}

fn default_interval() -> u64 {
    5
}

impl DeviceCode {
    /// The URL to open, preferring the one with the code pre-filled.
    pub fn url(&self) -> &str {
        self.verification_uri_complete
            .as_deref()
            .unwrap_or(&self.verification_uri)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthError {
    /// No identity provider configured.
    NotConfigured,
    /// Provider unreachable.
    Network(String),
    /// The user declined, or the provider refused the grant.
    Denied(String),
    /// The device code ran out before the user approved it.
    Expired,
    /// Provider answered with something unexpected.
    Parse(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::NotConfigured => write!(f, "Auth0 not configured"),
            AuthError::Network(msg) => write!(f, "network error: {msg}"),
            AuthError::Denied(msg) => write!(f, "login denied: {msg}"),
            AuthError::Expired => write!(f, "login code expired"),
            AuthError::Parse(msg) => write!(f, "unexpected auth response: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

#[async_trait]
pub trait AuthAdapter: Send + Sync {
    fn state(&self) -> AuthState;

    /// Current bearer token, refreshed if needed. `None` when signed out or
    /// when the provider cannot be reached; failures are logged, not raised.
    async fn access_token(&self) -> Option<String>;

    /// Begins an interactive login.
    async fn start_login(&self) -> Result<DeviceCode, AuthError>;

    /// Waits for the user to approve `code` and stores the resulting session.
    async fn complete_login(&self, code: &DeviceCode) -> Result<AuthState, AuthError>;

    async fn logout(&self);
}

// ============================================================================
// Anonymous / static adapters
// ============================================================================

/// Used when no identity provider is configured. Always anonymous.
pub struct DisabledAuth;

#[async_trait]
impl AuthAdapter for DisabledAuth {
    fn state(&self) -> AuthState {
        AuthState::default()
    }

    async fn access_token(&self) -> Option<String> {
        None
    }

    async fn start_login(&self) -> Result<DeviceCode, AuthError> {
        warn!("Login requested but Auth0 is not configured");
        Err(AuthError::NotConfigured)
    }

    async fn complete_login(&self, _code: &DeviceCode) -> Result<AuthState, AuthError> {
        Err(AuthError::NotConfigured)
    }

    async fn logout(&self) {
        warn!("Logout requested but Auth0 is not configured");
    }
}

/// A bearer token obtained out of band. Counts as signed in.
pub struct StaticTokenAuth {
    token: String,
}

impl StaticTokenAuth {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl AuthAdapter for StaticTokenAuth {
    fn state(&self) -> AuthState {
        AuthState {
            is_authenticated: true,
            is_loading: false,
            user: None,
        }
    }

    async fn access_token(&self) -> Option<String> {
        Some(self.token.clone())
    }

    async fn start_login(&self) -> Result<DeviceCode, AuthError> {
        Err(AuthError::Denied("a fixed access token is in use".to_string()))
    }

    async fn complete_login(&self, _code: &DeviceCode) -> Result<AuthState, AuthError> {
        Ok(self.state())
    }

    async fn logout(&self) {
        info!("Static token cannot be revoked; unset LEXI_ACCESS_TOKEN to sign out");
    }
}

/// Picks the adapter for a resolved config: a static token wins, then
/// Auth0 when both domain and client id are set, else anonymous.
pub fn build_auth(config: &ResolvedConfig) -> Arc<dyn AuthAdapter> {
    if let Some(token) = &config.access_token {
        info!("Using access token from configuration");
        return Arc::new(StaticTokenAuth::new(token.clone()));
    }
    match (&config.auth0_domain, &config.auth0_client_id) {
        (Some(domain), Some(client_id)) => {
            info!("Auth0 configured for domain {}", domain);
            Arc::new(Auth0Auth::new(
                format!("https://{}", domain.trim_end_matches('/')),
                client_id.clone(),
                config.auth0_audience.clone(),
                CredentialStore::default_location(),
            ))
        }
        _ => {
            info!("Auth0 not configured, running anonymously");
            Arc::new(DisabledAuth)
        }
    }
}
