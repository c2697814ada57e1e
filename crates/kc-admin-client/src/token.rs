//! Admin token acquisition and caching.
//!
//! Tokens come from the resource-owner password grant. A cached token is
//! reused until shortly before it expires; renewal prefers the refresh token
//! and falls back to a new password grant.

use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::sync::Mutex;

use crate::config::ConnectionConfig;
use crate::error::{ClientError, ClientResult};

/// Tokens closer than this to expiry are renewed before use.
const EXPIRY_MARGIN: Duration = Duration::from_secs(30);

/// A cached access token.
#[derive(Clone)]
pub struct AccessToken {
    value: String,
    expires_at: Instant,
    refresh_token: Option<String>,
    refresh_expires_at: Option<Instant>,
}

impl AccessToken {
    fn from_response(response: TokenResponse, now: Instant) -> Self {
        let refresh_expires_at = match (&response.refresh_token, response.refresh_expires_in) {
            (Some(_), Some(secs)) if secs > 0 => Some(now + Duration::from_secs(secs)),
            // Offline tokens report 0: no expiry.
            (Some(_), _) => None,
            (None, _) => Some(now),
        };
        Self {
            value: response.access_token,
            expires_at: now + Duration::from_secs(response.expires_in),
            refresh_token: response.refresh_token,
            refresh_expires_at,
        }
    }

    /// Returns true if the token can still be used at `now`.
    #[must_use]
    pub fn is_fresh(&self, now: Instant) -> bool {
        self.expires_at > now + EXPIRY_MARGIN
    }

    /// Returns the refresh token if it is still valid at `now`.
    #[must_use]
    pub fn usable_refresh_token(&self, now: Instant) -> Option<&str> {
        let token = self.refresh_token.as_deref()?;
        match self.refresh_expires_at {
            Some(expires_at) if expires_at <= now + EXPIRY_MARGIN => None,
            _ => Some(token),
        }
    }

    /// Returns the bearer value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("expires_at", &self.expires_at)
            .field("has_refresh_token", &self.refresh_token.is_some())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    refresh_expires_in: Option<u64>,
}

/// Obtains and caches admin tokens.
pub struct TokenManager {
    http: reqwest::Client,
    config: ConnectionConfig,
    token: Mutex<Option<AccessToken>>,
}

impl TokenManager {
    /// Creates a token manager. No request is made until a token is needed.
    #[must_use]
    pub fn new(http: reqwest::Client, config: ConnectionConfig) -> Self {
        Self {
            http,
            config,
            token: Mutex::new(None),
        }
    }

    /// Performs the password grant now and caches the result.
    pub async fn authenticate(&self) -> ClientResult<()> {
        let token = self.password_grant().await?;
        *self.token.lock().await = Some(token);
        Ok(())
    }

    /// Returns a valid bearer token, renewing it if needed.
    pub async fn access_token(&self) -> ClientResult<String> {
        let mut guard = self.token.lock().await;
        let now = Instant::now();

        if let Some(token) = guard.as_ref() {
            if token.is_fresh(now) {
                return Ok(token.value.clone());
            }
        }

        let refreshed = match guard.as_ref().and_then(|t| t.usable_refresh_token(now)) {
            Some(refresh_token) => match self.refresh_grant(refresh_token).await {
                Ok(token) => Some(token),
                Err(e) => {
                    tracing::debug!(error = %e, "refresh grant failed, falling back to password grant");
                    None
                }
            },
            None => None,
        };

        let token = match refreshed {
            Some(token) => token,
            None => self.password_grant().await?,
        };

        let value = token.value.clone();
        *guard = Some(token);
        Ok(value)
    }

    /// Drops the cached token so the next call authenticates again.
    pub async fn invalidate(&self) {
        *self.token.lock().await = None;
    }

    async fn password_grant(&self) -> ClientResult<AccessToken> {
        let mut form = vec![
            ("grant_type", "password"),
            ("client_id", self.config.client_id.as_str()),
            ("username", self.config.username.as_str()),
            ("password", self.config.password.as_str()),
            ("scope", self.config.scope.as_str()),
        ];
        if let Some(secret) = self.config.client_secret.as_deref() {
            form.push(("client_secret", secret));
        }

        let token = self.request_token(&form).await?;
        tracing::info!(
            realm = %self.config.auth_realm,
            username = %self.config.username,
            "obtained admin token"
        );
        Ok(token)
    }

    async fn refresh_grant(&self, refresh_token: &str) -> ClientResult<AccessToken> {
        let mut form = vec![
            ("grant_type", "refresh_token"),
            ("client_id", self.config.client_id.as_str()),
            ("refresh_token", refresh_token),
        ];
        if let Some(secret) = self.config.client_secret.as_deref() {
            form.push(("client_secret", secret));
        }

        let token = self.request_token(&form).await?;
        tracing::debug!(realm = %self.config.auth_realm, "refreshed admin token");
        Ok(token)
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> ClientResult<AccessToken> {
        let response = self
            .http
            .post(self.config.token_url())
            .form(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::Auth(format!(
                "token endpoint returned {}: {}",
                status.as_u16(),
                message
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse(format!("token response: {e}")))?;
        Ok(AccessToken::from_response(body, Instant::now()))
    }
}
