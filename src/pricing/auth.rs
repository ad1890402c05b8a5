//! Bearer token handling for the TCGplayer API

use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::messages::TokenResponse;
use crate::common::errors::{BotError, Result};
use crate::config::types::ApiCredentials;

/// Refresh this long before the provider-declared expiry
const EXPIRY_MARGIN_SECONDS: i64 = 60;

/// An access token and the time it stops being usable
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn from_response(response: TokenResponse, now: DateTime<Utc>) -> Self {
        Self {
            value: response.access_token,
            expires_at: now + Duration::seconds(response.expires_in),
        }
    }

    /// Whether the token is still good at `now`, keeping a safety margin
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_MARGIN_SECONDS) < self.expires_at
    }
}

/// Caches one bearer token and renews it on expiry
#[derive(Debug)]
pub struct TokenManager {
    credentials: ApiCredentials,
    token_url: String,
    token: RwLock<Option<AccessToken>>,
}

impl TokenManager {
    pub fn new(credentials: ApiCredentials, base_url: &str) -> Self {
        Self {
            credentials,
            token_url: format!("{}/token", base_url.trim_end_matches('/')),
            token: RwLock::new(None),
        }
    }

    /// Current token, requesting a new one if none is cached or it expired
    pub async fn bearer(&self, client: &Client) -> Result<String> {
        let now = Utc::now();
        if let Some(token) = self.token.read().await.as_ref() {
            if token.is_valid_at(now) {
                return Ok(token.value.clone());
            }
        }

        let mut guard = self.token.write().await;
        // Another task may have renewed while we waited for the lock
        if let Some(token) = guard.as_ref() {
            if token.is_valid_at(Utc::now()) {
                return Ok(token.value.clone());
            }
        }

        let token = self.request_token(client).await?;
        let value = token.value.clone();
        *guard = Some(token);
        Ok(value)
    }

    /// Drop the cached token so the next request renews it
    pub async fn invalidate(&self) {
        debug!("Invalidating cached TCGplayer token");
        *self.token.write().await = None;
    }

    async fn request_token(&self, client: &Client) -> Result<AccessToken> {
        debug!("Requesting TCGplayer access token from {}", self.token_url);

        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.credentials.public_key.as_str()),
            ("client_secret", self.credentials.private_key.as_str()),
        ];

        let response = client.post(&self.token_url).form(&params).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(BotError::Authentication(format!(
                "Token endpoint returned status {}: {}",
                status, body
            )));
        }

        let token_response: TokenResponse = response.json().await?;
        let token = AccessToken::from_response(token_response, Utc::now());
        info!("Obtained TCGplayer access token valid until {}", token.expires_at);
        Ok(token)
    }
}

/// Add a bearer token to a reqwest RequestBuilder
pub fn apply_bearer(request: reqwest::RequestBuilder, token: &str) -> reqwest::RequestBuilder {
    request.header(reqwest::header::AUTHORIZATION, format!("bearer {}", token))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_validity_margin() {
        let now = Utc::now();
        let token = AccessToken::from_response(
            TokenResponse {
                access_token: "abc".to_string(),
                token_type: Some("bearer".to_string()),
                expires_in: 120,
                user_name: None,
            },
            now,
        );

        assert!(token.is_valid_at(now));
        assert!(token.is_valid_at(now + Duration::seconds(30)));
        // Inside the renewal margin
        assert!(!token.is_valid_at(now + Duration::seconds(61)));
    }

    #[test]
    fn test_token_url_normalization() {
        let manager = TokenManager::new(
            ApiCredentials::new("public".to_string(), "private".to_string()),
            "https://api.tcgplayer.com/",
        );
        assert_eq!(manager.token_url, "https://api.tcgplayer.com/token");
    }
}
