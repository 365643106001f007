//! Auth0 adapter for a terminal client.
//!
//! Uses the OAuth 2.0 device authorization grant: the user approves the
//! login in a browser while we poll the token endpoint. Tokens are cached
//! through [`CredentialStore`] and refreshed once when they expire.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use log::{debug, info, warn};
use serde::Deserialize;

use super::credentials::{CredentialStore, Credentials};
use super::{AuthAdapter, AuthError, AuthState, DeviceCode, Profile};

const LOGIN_SCOPE: &str = "openid profile email offline_access";
const DEVICE_GRANT: &str = "urn:ietf:params:oauth:grant-type:device_code";
/// Extra wait the provider asks for on `slow_down`.
const SLOW_DOWN_STEP_SECS: u64 = 5;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default = "default_token_ttl")]
    expires_in: i64,
}

fn default_token_ttl() -> i64 {
    3600
}

/// Absolute expiry for a token lifetime in seconds. Lifetimes that do not
/// fit a timestamp fall back to the default.
fn expiry_from(expires_in: i64) -> DateTime<Utc> {
    let now = Utc::now();
    TimeDelta::try_seconds(expires_in)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .unwrap_or_else(|| now + TimeDelta::seconds(default_token_ttl()))
}

#[derive(Debug, Deserialize)]
struct OAuthError {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

impl OAuthError {
    fn describe(&self) -> String {
        self.error_description
            .clone()
            .unwrap_or_else(|| self.error.clone())
    }
}

#[derive(Default)]
struct Session {
    credentials: Option<Credentials>,
    logging_in: bool,
}

pub struct Auth0Auth {
    base_url: String,
    client_id: String,
    audience: Option<String>,
    client: reqwest::Client,
    store: CredentialStore,
    session: RwLock<Session>,
}

impl Auth0Auth {
    /// `base_url` is the tenant origin, e.g. `https://tenant.eu.auth0.com`.
    pub fn new(
        base_url: String,
        client_id: String,
        audience: Option<String>,
        store: CredentialStore,
    ) -> Self {
        let credentials = store.load();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client_id,
            audience,
            client: reqwest::Client::new(),
            store,
            session: RwLock::new(Session {
                credentials,
                logging_in: false,
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Session> {
        self.session.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Session> {
        self.session.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_logging_in(&self, value: bool) {
        self.write().logging_in = value;
    }

    /// POSTs a form to the token endpoint. The outer error is transport or
    /// parse trouble, the inner one is an OAuth error answer.
    async fn post_token(
        &self,
        form: &[(&str, &str)],
    ) -> Result<Result<TokenResponse, OAuthError>, AuthError> {
        let response = self
            .client
            .post(format!("{}/oauth/token", self.base_url))
            .form(form)
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        if status.is_success() {
            return serde_json::from_str(&body)
                .map(Ok)
                .map_err(|e| AuthError::Parse(e.to_string()));
        }
        serde_json::from_str::<OAuthError>(&body)
            .map(Err)
            .map_err(|_| AuthError::Parse(format!("HTTP {}: {}", status.as_u16(), body)))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, AuthError> {
        let form = [
            ("grant_type", "refresh_token"),
            ("client_id", self.client_id.as_str()),
            ("refresh_token", refresh_token),
        ];
        self.post_token(&form)
            .await?
            .map_err(|e| AuthError::Denied(e.describe()))
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<Profile, AuthError> {
        let response = self
            .client
            .get(format!("{}/userinfo", self.base_url))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;
        if !response.status().is_success() {
            return Err(AuthError::Denied(format!(
                "userinfo returned HTTP {}",
                response.status().as_u16()
            )));
        }
        response
            .json::<Profile>()
            .await
            .map_err(|e| AuthError::Parse(e.to_string()))
    }

    /// Persists a token response and makes it the active session.
    fn store_tokens(
        &self,
        token: TokenResponse,
        profile: Option<Profile>,
        previous_refresh: Option<String>,
    ) -> Credentials {
        let credentials = Credentials {
            access_token: token.access_token,
            refresh_token: token.refresh_token.or(previous_refresh),
            expires_at: expiry_from(token.expires_in),
            profile,
        };
        if let Err(e) = self.store.save(&credentials) {
            warn!("Failed to cache credentials: {}", e);
        }
        self.write().credentials = Some(credentials.clone());
        credentials
    }

    async fn request_device_code(&self, form: &[(&str, &str)]) -> Result<DeviceCode, AuthError> {
        let response = self
            .client
            .post(format!("{}/oauth/device/code", self.base_url))
            .form(form)
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;
        if !status.is_success() {
            let reason = serde_json::from_str::<OAuthError>(&body)
                .map(|e| e.describe())
                .unwrap_or_else(|_| format!("HTTP {}", status.as_u16()));
            return Err(AuthError::Denied(reason));
        }
        serde_json::from_str(&body).map_err(|e| AuthError::Parse(e.to_string()))
    }

    async fn poll_for_token(&self, code: &DeviceCode) -> Result<TokenResponse, AuthError> {
        // No deadline when the lifetime overflows the clock
        let deadline = Instant::now().checked_add(Duration::from_secs(code.expires_in));
        let mut interval = code.interval;
        let form = [
            ("grant_type", DEVICE_GRANT),
            ("device_code", code.device_code.as_str()),
            ("client_id", self.client_id.as_str()),
        ];

        loop {
            tokio::time::sleep(Duration::from_secs(interval)).await;
            if deadline.is_some_and(|d| Instant::now() > d) {
                return Err(AuthError::Expired);
            }
            match self.post_token(&form).await? {
                Ok(token) => return Ok(token),
                Err(e) => match e.error.as_str() {
                    "authorization_pending" => debug!("Device login still pending"),
                    "slow_down" => {
                        interval = interval.saturating_add(SLOW_DOWN_STEP_SECS);
                        debug!("Provider asked to slow down, polling every {}s", interval);
                    }
                    "expired_token" => return Err(AuthError::Expired),
                    _ => return Err(AuthError::Denied(e.describe())),
                },
            }
        }
    }
}

#[async_trait]
impl AuthAdapter for Auth0Auth {
    fn state(&self) -> AuthState {
        let session = self.read();
        AuthState {
            is_authenticated: session.credentials.is_some(),
            is_loading: session.logging_in,
            user: session.credentials.as_ref().and_then(|c| c.profile.clone()),
        }
    }

    async fn access_token(&self) -> Option<String> {
        let credentials = self.read().credentials.clone()?;
        if credentials.is_fresh(Utc::now()) {
            return Some(credentials.access_token);
        }
        let Some(refresh_token) = credentials.refresh_token.clone() else {
            debug!("Access token expired and no refresh token is cached");
            return None;
        };
        match self.refresh(&refresh_token).await {
            Ok(token) => {
                info!("Access token refreshed");
                let updated = self.store_tokens(token, credentials.profile, Some(refresh_token));
                Some(updated.access_token)
            }
            Err(AuthError::Denied(reason)) => {
                warn!("Refresh token rejected, signing out: {}", reason);
                self.write().credentials = None;
                if let Err(e) = self.store.clear() {
                    warn!("Failed to remove cached credentials: {}", e);
                }
                None
            }
            Err(e) => {
                warn!("Token refresh failed: {}", e);
                None
            }
        }
    }

    async fn start_login(&self) -> Result<DeviceCode, AuthError> {
        self.set_logging_in(true);
        let mut form = vec![
            ("client_id", self.client_id.as_str()),
            ("scope", LOGIN_SCOPE),
        ];
        if let Some(audience) = &self.audience {
            form.push(("audience", audience.as_str()));
        }

        let result = self.request_device_code(&form).await;

        match &result {
            Ok(code) => info!("Device login started, user code {}", code.user_code),
            Err(e) => {
                warn!("Could not start device login: {}", e);
                self.set_logging_in(false);
            }
        }
        result
    }

    async fn complete_login(&self, code: &DeviceCode) -> Result<AuthState, AuthError> {
        self.set_logging_in(true);
        let result = self.poll_for_token(code).await;
        let outcome = match result {
            Ok(token) => {
                let profile = match self.fetch_profile(&token.access_token).await {
                    Ok(profile) => Some(profile),
                    Err(e) => {
                        warn!("Could not fetch user profile: {}", e);
                        None
                    }
                };
                self.store_tokens(token, profile, None);
                info!("Device login completed");
                Ok(())
            }
            Err(e) => {
                warn!("Device login failed: {}", e);
                Err(e)
            }
        };
        self.set_logging_in(false);
        outcome.map(|()| self.state())
    }

    async fn logout(&self) {
        self.write().credentials = None;
        if let Err(e) = self.store.clear() {
            warn!("Failed to remove cached credentials: {}", e);
        }
        info!("Logged out");
    }
}
