use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::configuration::EmailClientSettings;
use crate::domain::campaign::errors::DeliveryError;

/// Tokens are refreshed this long before the authority says they expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(serde::Deserialize)]
struct TokenResponse {
    access_token: Secret<String>,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Debug)]
struct CachedToken {
    access_token: Secret<String>,
    expires_at: Instant,
}

#[derive(Debug)]
enum TokenState {
    Empty,
    Valid(CachedToken),
    /// The authority refused the credentials. Kept for the rest of the run.
    Rejected(String),
}

/// OAuth2 client-credentials grant against the identity authority.
///
/// One token is shared by every concurrent send and fetched again only once
/// it is about to expire or has been invalidated. A refused token request is
/// remembered, so later sends fail without asking the authority again.
#[derive(Debug)]
pub struct ClientCredentialsToken {
    http_client: Client,
    token_url: String,
    client_id: String,
    client_secret: Secret<String>,
    scope: String,
    state: Mutex<TokenState>,
}

impl ClientCredentialsToken {
    pub fn new(http_client: Client, configuration: &EmailClientSettings) -> Self {
        Self {
            http_client,
            token_url: configuration.token_url(),
            client_id: configuration.client_id.clone(),
            client_secret: configuration.client_secret.clone(),
            scope: configuration.scope(),
            state: Mutex::new(TokenState::Empty),
        }
    }

    pub async fn access_token(&self) -> Result<Secret<String>, DeliveryError> {
        let mut state = self.state.lock().await;
        match &*state {
            TokenState::Valid(token) if Instant::now() < token.expires_at => {
                return Ok(token.access_token.clone());
            }
            TokenState::Rejected(reason) => return Err(DeliveryError::AuthError(reason.clone())),
            _ => {}
        }
        match self.request_token().await {
            Ok(token) => {
                let access_token = token.access_token.clone();
                *state = TokenState::Valid(token);
                Ok(access_token)
            }
            Err(DeliveryError::AuthError(reason)) => {
                *state = TokenState::Rejected(reason.clone());
                Err(DeliveryError::AuthError(reason))
            }
            Err(e) => Err(e),
        }
    }

    /// Drops the cached token so the next send requests a new one.
    pub async fn invalidate(&self) {
        let mut state = self.state.lock().await;
        if matches!(*state, TokenState::Valid(_)) {
            *state = TokenState::Empty;
        }
    }

    #[tracing::instrument(name = "Request access token", skip(self))]
    async fn request_token(&self) -> Result<CachedToken, DeliveryError> {
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose_secret().as_str()),
            ("scope", self.scope.as_str()),
        ];
        let response = self
            .http_client
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                DeliveryError::Unexpected(
                    anyhow::Error::new(e).context("Failed to reach the identity authority."),
                )
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(DeliveryError::AuthError(format!(
                "token request failed ({}): {}",
                status, body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| DeliveryError::AuthError(e.to_string()))?;
        tracing::debug!(expires_in = token.expires_in, "Acquired access token");

        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: expires_at(Instant::now(), token.expires_in),
        })
    }
}

fn expires_at(now: Instant, expires_in: u64) -> Instant {
    let lifetime = |seconds: u64| Duration::from_secs(seconds).saturating_sub(EXPIRY_MARGIN);
    now.checked_add(lifetime(expires_in))
        .unwrap_or_else(|| now + lifetime(default_expires_in()))
}
