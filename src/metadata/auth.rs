//! Twitch client-credentials authentication for the IGDB API.
//!
//! IGDB sits behind the Twitch developer program: every request must carry
//! a `Client-ID` header and a bearer token obtained from the Twitch OAuth
//! token endpoint. Tokens are fetched lazily: on the first request, and
//! again on the first request after expiry. An async mutex around the
//! token state serializes overlapping refreshes so concurrent requests
//! during the refresh window cannot race a second exchange.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use reqwest::RequestBuilder;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::info;

const TOKEN_ENDPOINT: &str = "https://id.twitch.tv/oauth2/token";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    /// Lifetime in seconds. Absent means the token never expires.
    expires_in: Option<i64>,
}

#[derive(Default)]
struct TokenState {
    access_token: Option<String>,
    expires_at: Option<DateTime<Utc>>,
}

impl TokenState {
    fn valid_token(&self) -> Option<&str> {
        let token = self.access_token.as_deref()?;
        match self.expires_at {
            Some(expires_at) if Utc::now() >= expires_at => None,
            _ => Some(token),
        }
    }
}

/// Request-signing layer for the IGDB API.
pub struct TwitchAuth {
    client: reqwest::Client,
    token_endpoint: String,
    client_id: String,
    client_secret: String,
    state: Mutex<TokenState>,
}

impl TwitchAuth {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self::with_token_endpoint(client_id, client_secret, TOKEN_ENDPOINT)
    }

    /// Point the token exchange at a non-default endpoint (tests).
    pub fn with_token_endpoint(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        token_endpoint: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            token_endpoint: token_endpoint.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            state: Mutex::new(TokenState::default()),
        }
    }

    /// Attach `Client-ID` and `Authorization: Bearer` headers, fetching or
    /// refreshing the token first when needed. A failed exchange fails the
    /// request.
    pub async fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let token = self.access_token().await?;
        Ok(request
            .header("Client-ID", &self.client_id)
            .bearer_auth(token))
    }

    async fn access_token(&self) -> Result<String> {
        let mut state = self.state.lock().await;

        if let Some(token) = state.valid_token() {
            return Ok(token.to_string());
        }

        let response = self
            .client
            .post(&self.token_endpoint)
            .query(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await
            .context("Twitch token request failed")?
            .error_for_status()
            .context("Twitch token endpoint returned an error")?;

        let token: TokenResponse = response
            .json()
            .await
            .context("Failed to parse Twitch token response")?;

        state.expires_at = token.expires_in.map(|secs| Utc::now() + Duration::seconds(secs));
        match state.expires_at {
            Some(expires_at) => info!("Obtained Twitch access token, expires at {}", expires_at),
            None => info!("Obtained Twitch access token with no expiry"),
        }
        state.access_token = Some(token.access_token.clone());

        Ok(token.access_token)
    }
}
