//! Upstream access tokens
//!
//! The upstream uses OAuth2 client credentials. Tokens are cached until shortly before
//! they expire; this is the only state shared between inbound requests.

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::UpstreamFailure;
use crate::error::ServiceError;

/// Refresh tokens this long before the upstream says they expire
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Assumed lifetime when the token response omits `expires_in`
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(300);

/// Source of bearer tokens for upstream calls
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Token to send, or `None` for unauthenticated calls
    async fn access_token(&self, http: &Client, request_id: &str)
    -> Result<Option<String>, ServiceError>;
}

/// A pre-issued token from configuration
pub struct StaticToken {
    token: String,
}

impl StaticToken {
    pub fn new(token: String) -> Self {
        Self { token }
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(
        &self,
        _http: &Client,
        _request_id: &str,
    ) -> Result<Option<String>, ServiceError> {
        Ok(Some(self.token.clone()))
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

struct CachedToken {
    value: String,
    refresh_at: Instant,
}

/// OAuth2 client-credentials grant against the upstream token endpoint
pub struct ClientCredentials {
    token_url: String,
    client_id: String,
    client_secret: String,
    cached: Mutex<Option<CachedToken>>,
}

impl ClientCredentials {
    pub fn new(token_url: String, client_id: String, client_secret: String) -> Self {
        Self {
            token_url,
            client_id,
            client_secret,
            cached: Mutex::new(None),
        }
    }

    async fn fetch(&self, http: &Client, request_id: &str) -> Result<CachedToken, ServiceError> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];

        let response = http
            .post(&self.token_url)
            .header("x-request-id", request_id)
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                warn!(request_id, error = %e, "Token endpoint unreachable");
                UpstreamFailure::transport(&e)
            })?;

        let status = response.status();
        let headers = response.headers().clone();
        let text = response
            .text()
            .await
            .map_err(|e| UpstreamFailure::transport(&e))?;

        if !status.is_success() {
            warn!(request_id, status = status.as_u16(), "Token request rejected");
            return Err(UpstreamFailure::from_response(status.as_u16(), headers, text).into());
        }

        let token: TokenResponse =
            serde_json::from_str(&text).with_context(|| "Failed to parse token response")?;

        let lifetime = token
            .expires_in
            .map_or(DEFAULT_TOKEN_LIFETIME, Duration::from_secs);
        info!(request_id, expires_in = lifetime.as_secs(), "Obtained upstream access token");

        Ok(CachedToken {
            value: token.access_token,
            refresh_at: Instant::now() + lifetime.saturating_sub(EXPIRY_MARGIN),
        })
    }
}

#[async_trait]
impl TokenSource for ClientCredentials {
    async fn access_token(
        &self,
        http: &Client,
        request_id: &str,
    ) -> Result<Option<String>, ServiceError> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(Some(token.value.clone()));
            }
            debug!(request_id, "Cached upstream token expired");
        }

        let token = self.fetch(http, request_id).await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(Some(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn credentials(server: &MockServer) -> ClientCredentials {
        ClientCredentials::new(
            server.url("/v1/security/oauth2/token"),
            "client".to_string(),
            "secret".to_string(),
        )
    }

    #[tokio::test]
    async fn test_token_is_fetched_once_and_cached() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/security/oauth2/token")
                    .body_includes("grant_type=client_credentials")
                    .body_includes("client_id=client");
                then.status(200).json_body(json!({
                    "type": "amadeusOAuth2Token",
                    "access_token": "abc123",
                    "expires_in": 1799
                }));
            })
            .await;

        let source = credentials(&server);
        let http = Client::new();
        let first = source.access_token(&http, "req-1").await.unwrap();
        let second = source.access_token(&http, "req-2").await.unwrap();

        assert_eq!(first.as_deref(), Some("abc123"));
        assert_eq!(second.as_deref(), Some("abc123"));
        mock.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn test_short_lived_token_is_refreshed() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/security/oauth2/token");
                then.status(200)
                    .json_body(json!({"access_token": "short", "expires_in": 30}));
            })
            .await;

        let source = credentials(&server);
        let http = Client::new();
        source.access_token(&http, "req-1").await.unwrap();
        source.access_token(&http, "req-2").await.unwrap();

        mock.assert_hits_async(2).await;
    }

    #[tokio::test]
    async fn test_token_without_expiry_is_still_cached() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/security/oauth2/token");
                then.status(200).json_body(json!({"access_token": "no-expiry"}));
            })
            .await;

        let source = credentials(&server);
        let http = Client::new();
        for request_id in ["req-1", "req-2", "req-3"] {
            let token = source.access_token(&http, request_id).await.unwrap();
            assert_eq!(token.as_deref(), Some("no-expiry"));
        }

        mock.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn test_rejected_credentials_surface_as_upstream_failure() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/security/oauth2/token");
                then.status(401).json_body(json!({
                    "error": "invalid_client",
                    "error_description": "Client credentials are invalid"
                }));
            })
            .await;

        let source = credentials(&server);
        let err = source
            .access_token(&Client::new(), "req-1")
            .await
            .unwrap_err();

        let ServiceError::Upstream(failure) = err else {
            panic!("expected upstream failure, got {err:?}");
        };
        assert_eq!(failure.status, 401);
    }

    #[tokio::test]
    async fn test_static_token_needs_no_network() {
        let source = StaticToken::new("fixed".to_string());
        let token = source.access_token(&Client::new(), "req-1").await.unwrap();
        assert_eq!(token.as_deref(), Some("fixed"));
    }
}
