use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::TOKEN_EXPIRY_BUFFER_SECS;
use crate::error::{AppError, Result};

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// OAuth2 client-credentials token source for the Battle.net API.
///
/// The cached token is shared read-only by all concurrent fetches. Refresh
/// runs under a mutex held across the token request, so at most one refresh
/// is in flight and concurrent callers wait on it instead of each firing
/// their own.
pub struct TokenProvider {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    state: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(
        http: reqwest::Client,
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            http,
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            state: Mutex::new(None),
        }
    }

    /// Current access token, refreshing it first if expired or never fetched.
    pub async fn access_token(&self) -> Result<String> {
        let mut state = self.state.lock().await;

        if let Some(token) = state.as_ref() {
            if Instant::now() < token.expires_at {
                return Ok(token.access_token.clone());
            }
        }

        let fresh = self.request_token().await?;
        let access_token = fresh.access_token.clone();
        *state = Some(fresh);
        Ok(access_token)
    }

    async fn request_token(&self) -> Result<CachedToken> {
        debug!(token_url = %self.token_url, "requesting OAuth access token");

        let response = self
            .http
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Auth(format!(
                "token endpoint returned status {status}"
            )));
        }

        let token: TokenResponse = response.json().await?;
        let lifetime = token.expires_in.saturating_sub(TOKEN_EXPIRY_BUFFER_SECS);

        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(lifetime),
        })
    }
}
