//! Access token providers for the calendar API

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use cadence_core::{AccessToken, TokenProvider};
use cadence_domain::{CadenceError, CalendarConfig, OAuthClientConfig, Result};
use parking_lot::Mutex;
use reqwest::Method;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::errors::status_error;
use crate::http::HttpClient;

/// Tokens are refreshed this long before the provider says they expire.
const EXPIRY_SKEW: Duration = Duration::from_secs(60);
/// Lifetime assumed when the token endpoint omits `expires_in`.
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);

/// Hands out one pre-issued token.
pub struct StaticTokenProvider {
    provider: String,
    token: AccessToken,
}

impl StaticTokenProvider {
    pub fn new(provider: impl Into<String>, token: impl Into<String>) -> Self {
        Self { provider: provider.into(), token: AccessToken::new(token) }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn access_token(&self, provider: &str) -> Result<AccessToken> {
        ensure_provider(&self.provider, provider)?;
        Ok(self.token.clone())
    }
}

struct CachedToken {
    token: AccessToken,
    refresh_after: Instant,
}

/// Exchanges a long-lived refresh token for short-lived access tokens and
/// caches the result until shortly before it expires.
pub struct OAuthRefreshTokenProvider {
    provider: String,
    client: OAuthClientConfig,
    http: HttpClient,
    cached: Mutex<Option<CachedToken>>,
}

impl OAuthRefreshTokenProvider {
    pub fn new(provider: impl Into<String>, client: OAuthClientConfig, http: HttpClient) -> Self {
        Self { provider: provider.into(), client, http, cached: Mutex::new(None) }
    }

    fn cached_token(&self) -> Option<AccessToken> {
        self.cached
            .lock()
            .as_ref()
            .filter(|cached| Instant::now() < cached.refresh_after)
            .map(|cached| cached.token.clone())
    }

    async fn refresh(&self) -> Result<(AccessToken, Duration)> {
        let mut form = vec![
            ("grant_type", "refresh_token"),
            ("client_id", self.client.client_id.as_str()),
            ("refresh_token", self.client.refresh_token.as_str()),
        ];
        if let Some(secret) = self.client.client_secret.as_deref() {
            form.push(("client_secret", secret));
        }

        let request = self.http.request(Method::POST, &self.client.token_endpoint).form(&form);
        let response = self.http.send_once(request).await.map_err(as_auth_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(as_auth_error(status_error(status, Some(&body))));
        }

        let payload: TokenResponse = response
            .json()
            .await
            .map_err(|err| CadenceError::Auth(format!("invalid token response: {err}")))?;
        if payload.access_token.trim().is_empty() {
            return Err(CadenceError::Auth("token endpoint returned an empty access token".into()));
        }

        let lifetime = payload.expires_in.map_or(DEFAULT_TOKEN_LIFETIME, Duration::from_secs);
        Ok((AccessToken::new(payload.access_token), lifetime))
    }
}

#[async_trait]
impl TokenProvider for OAuthRefreshTokenProvider {
    #[instrument(skip(self))]
    async fn access_token(&self, provider: &str) -> Result<AccessToken> {
        ensure_provider(&self.provider, provider)?;

        if let Some(token) = self.cached_token() {
            debug!("Using cached access token");
            return Ok(token);
        }

        let (token, lifetime) = self.refresh().await?;
        info!(expires_in_secs = lifetime.as_secs(), "Refreshed calendar access token");

        *self.cached.lock() = Some(CachedToken {
            token: token.clone(),
            refresh_after: Instant::now() + lifetime.saturating_sub(EXPIRY_SKEW),
        });
        Ok(token)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<u64>,
}

/// Pick a provider from configuration: a static token wins over OAuth.
///
/// # Errors
/// Returns `CadenceError::Config` when neither is configured.
pub fn token_provider_from_config(
    config: &CalendarConfig,
    http: HttpClient,
) -> Result<Arc<dyn TokenProvider>> {
    if let Some(token) = config.access_token.as_deref().filter(|t| !t.trim().is_empty()) {
        return Ok(Arc::new(StaticTokenProvider::new(config.provider.clone(), token)));
    }
    if let Some(oauth) = &config.oauth {
        return Ok(Arc::new(OAuthRefreshTokenProvider::new(
            config.provider.clone(),
            oauth.clone(),
            http,
        )));
    }
    Err(CadenceError::Config(
        "calendar credentials missing: set calendar.access_token or calendar.oauth".into(),
    ))
}

fn ensure_provider(configured: &str, requested: &str) -> Result<()> {
    if configured.eq_ignore_ascii_case(requested) {
        Ok(())
    } else {
        Err(CadenceError::Auth(format!("no credentials configured for provider '{requested}'")))
    }
}

fn as_auth_error(err: CadenceError) -> CadenceError {
    match err {
        CadenceError::Auth(_) => err,
        other => CadenceError::Auth(format!("token refresh failed: {other}")),
    }
}
