//! Upstream API client
//!
//! Low-level transport to the travel-content provider. Every non-2xx response and every
//! transport failure comes back as an [`UpstreamFailure`]; nothing here retries.

pub mod auth;
pub mod retry;

use anyhow::Context;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::UpstreamConfig;
use crate::error::ServiceError;
use auth::TokenSource;

pub use retry::RetryPolicy;

/// Status recorded for failures where no HTTP response was received
pub const TRANSPORT_FAILURE_STATUS: u16 = 0;

/// A failed upstream exchange as plain data
#[derive(Debug, Clone)]
pub struct UpstreamFailure {
    /// HTTP status, or [`TRANSPORT_FAILURE_STATUS`] for DNS/connect/timeout failures
    pub status: u16,
    pub headers: HeaderMap,
    pub raw_body: String,
    pub parsed_body: Option<Value>,
}

impl UpstreamFailure {
    /// Build from a received non-2xx response
    pub fn from_response(status: u16, headers: HeaderMap, raw_body: String) -> Self {
        let parsed_body = serde_json::from_str(&raw_body).ok();
        Self {
            status,
            headers,
            raw_body,
            parsed_body,
        }
    }

    /// Build from a transport error (no response received)
    pub fn transport(err: &reqwest::Error) -> Self {
        let raw_body = if err.is_timeout() {
            format!("timeout: {err}")
        } else {
            err.to_string()
        };
        Self {
            status: TRANSPORT_FAILURE_STATUS,
            headers: HeaderMap::new(),
            raw_body,
            parsed_body: None,
        }
    }

    #[must_use]
    pub fn is_transport(&self) -> bool {
        self.status == TRANSPORT_FAILURE_STATUS
    }
}

impl fmt::Display for UpstreamFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_transport() {
            write!(f, "Upstream transport failure: {}", self.raw_body)
        } else {
            write!(f, "Upstream responded with status {}", self.status)
        }
    }
}

impl std::error::Error for UpstreamFailure {}

/// Authenticated client for the upstream API
#[derive(Clone)]
pub struct UpstreamClient {
    http: Client,
    base_url: String,
    tokens: Arc<dyn TokenSource>,
}

impl UpstreamClient {
    /// Create a client from configuration, choosing the token source from the credentials present
    pub fn new(config: &UpstreamConfig) -> anyhow::Result<Self> {
        let tokens: Arc<dyn TokenSource> = match &config.access_token {
            Some(token) => Arc::new(auth::StaticToken::new(token.clone())),
            None => Arc::new(auth::ClientCredentials::new(
                config.token_endpoint(),
                config.client_id.clone().unwrap_or_default(),
                config.client_secret.clone().unwrap_or_default(),
            )),
        };
        Self::with_token_source(config, tokens)
    }

    pub fn with_token_source(
        config: &UpstreamConfig,
        tokens: Arc<dyn TokenSource>,
    ) -> anyhow::Result<Self> {
        let timeout = Duration::from_secs(config.timeout_seconds.into());

        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent(concat!("travel-gateway/", env!("CARGO_PKG_VERSION")))
            .build()
            .with_context(|| "Failed to create HTTP client")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            tokens,
        })
    }

    pub async fn get(
        &self,
        path: &str,
        query: &[(&str, String)],
        request_id: &str,
    ) -> Result<Value, ServiceError> {
        self.call(Method::GET, path, query, None, request_id).await
    }

    pub async fn post(
        &self,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
        request_id: &str,
    ) -> Result<Value, ServiceError> {
        self.call(Method::POST, path, query, body, request_id).await
    }

    /// Perform one authenticated call and return the parsed JSON body.
    ///
    /// An empty 2xx body yields `Value::Null`.
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
        request_id: &str,
    ) -> Result<Value, ServiceError> {
        let token = self.tokens.access_token(&self.http, request_id).await?;

        let url = format!("{}{}", self.base_url, path);
        let mut request = self
            .http
            .request(method.clone(), &url)
            .header("x-request-id", request_id)
            .header(reqwest::header::ACCEPT, "application/json");

        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!(request_id, %method, path, "Calling upstream");
        let start = Instant::now();

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                let failure = UpstreamFailure::transport(&e);
                warn!(
                    request_id,
                    %method,
                    path,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    error = %e,
                    "Upstream transport failure"
                );
                return Err(failure.into());
            }
        };

        let status = response.status();
        let headers = response.headers().clone();
        let text = response.text().await.map_err(|e| {
            warn!(request_id, %method, path, error = %e, "Failed reading upstream body");
            UpstreamFailure::transport(&e)
        })?;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        if !status.is_success() {
            warn!(
                request_id,
                %method,
                path,
                status = status.as_u16(),
                elapsed_ms,
                "Upstream call failed"
            );
            return Err(UpstreamFailure::from_response(status.as_u16(), headers, text).into());
        }

        info!(
            request_id,
            %method,
            path,
            status = status.as_u16(),
            elapsed_ms,
            "Upstream call succeeded"
        );

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        let value = serde_json::from_str(&text)
            .with_context(|| format!("Upstream returned a non-JSON body for {path}"))?;
        Ok(value)
    }
}

/// Iterate the `data` array of an upstream body, tolerating a missing or non-array field
pub fn data_items(body: &Value) -> &[Value] {
    body.get("data")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::config::UpstreamConfig;

    /// Client pointing at a mock server with a fixed bearer token
    pub fn client_for(base_url: &str) -> UpstreamClient {
        let config = UpstreamConfig {
            base_url: base_url.to_string(),
            access_token: Some("test-token".to_string()),
            timeout_seconds: 2,
            ..UpstreamConfig::default()
        };
        UpstreamClient::new(&config).unwrap()
    }
}
