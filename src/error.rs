//! Error types and handling for the travel gateway
//!
//! `GatewayError` covers startup and configuration. `ServiceError` is the closed set of
//! failures a service can produce; the classifier turns it into an `ApiError`, the only
//! error shape that crosses a route handler.

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::upstream::UpstreamFailure;

/// Startup and configuration errors
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Server setup errors
    #[error("Server error: {message}")]
    Server { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl GatewayError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new server error
    pub fn server<S: Into<String>>(message: S) -> Self {
        Self::Server {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            GatewayError::Config { message } => {
                format!("Configuration error: {message}. Please check your config file and credentials.")
            }
            GatewayError::Server { message } => format!("Unable to start the gateway: {message}"),
            GatewayError::Io { .. } => {
                "File or socket operation failed. Please check permissions and ports.".to_string()
            }
        }
    }
}

/// Failures produced below the route handlers
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The upstream answered non-2xx, or could not be reached at all
    #[error(transparent)]
    Upstream(#[from] UpstreamFailure),

    /// A free-text keyword could not be turned into what the upstream needs
    #[error("Could not resolve '{keyword}' to a {target}")]
    Unresolved { keyword: String, target: &'static str },

    /// Anything else: malformed 2xx bodies, bugs
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn unresolved<S: Into<String>>(keyword: S, target: &'static str) -> Self {
        Self::Unresolved {
            keyword: keyword.into(),
            target,
        }
    }
}

/// Stable error codes returned to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiErrorCode {
    InvalidRequest,
    AuthFailed,
    RateLimited,
    NotAvailable,
    UpstreamError,
    InternalError,
}

impl ApiErrorCode {
    /// HTTP status returned to the gateway's caller
    #[must_use]
    pub fn http_status(self) -> u16 {
        match self {
            ApiErrorCode::InvalidRequest => 400,
            ApiErrorCode::AuthFailed => 401,
            ApiErrorCode::RateLimited => 429,
            ApiErrorCode::NotAvailable => 501,
            ApiErrorCode::UpstreamError => 502,
            ApiErrorCode::InternalError => 500,
        }
    }

    /// Whether the same call may succeed if repeated later.
    #[must_use]
    pub fn is_retryable(self) -> bool {
        matches!(self, ApiErrorCode::RateLimited | ApiErrorCode::UpstreamError)
    }

    #[must_use]
    pub fn default_message(self) -> &'static str {
        match self {
            ApiErrorCode::InvalidRequest => "The request was rejected as invalid",
            ApiErrorCode::AuthFailed => "Upstream authentication failed",
            ApiErrorCode::RateLimited => "Upstream rate limit exceeded",
            ApiErrorCode::NotAvailable => {
                "This capability is not available for the current upstream account or environment"
            }
            ApiErrorCode::UpstreamError => "The upstream service failed or could not be reached",
            ApiErrorCode::InternalError => "Internal gateway error",
        }
    }
}

/// The sole error type crossing the route-handler boundary
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
    pub request_id: String,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_sec: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ApiError {
    pub fn new<S: Into<String>>(code: ApiErrorCode, message: S, request_id: &str) -> Self {
        Self {
            code,
            message: message.into(),
            request_id: request_id.to_string(),
            status: code.http_status(),
            upstream_status: None,
            retry_after_sec: None,
            details: None,
        }
    }

    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

#[derive(Serialize)]
struct FailureEnvelope<'a> {
    ok: bool,
    #[serde(flatten)]
    error: &'a ApiError,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let retry_after = self.retry_after_sec;

        let mut response = (
            status,
            Json(FailureEnvelope {
                ok: false,
                error: &self,
            }),
        )
            .into_response();

        if let Some(seconds) = retry_after {
            if let Ok(value) = HeaderValue::from_str(&seconds.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_creation() {
        let config_err = GatewayError::config("missing client id");
        assert!(matches!(config_err, GatewayError::Config { .. }));
        assert!(config_err.user_message().contains("missing client id"));

        let server_err = GatewayError::server("port in use");
        assert!(server_err.user_message().contains("port in use"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::AddrInUse, "address in use");
        let gateway_err: GatewayError = io_err.into();
        assert!(matches!(gateway_err, GatewayError::Io { .. }));
    }

    #[test]
    fn test_unresolved_message_names_keyword() {
        let err = ServiceError::unresolved("Atlantis", "coordinate");
        assert_eq!(err.to_string(), "Could not resolve 'Atlantis' to a coordinate");
    }

    #[test]
    fn test_retryable_codes() {
        assert!(ApiErrorCode::RateLimited.is_retryable());
        assert!(ApiErrorCode::UpstreamError.is_retryable());
        assert!(!ApiErrorCode::NotAvailable.is_retryable());
        assert!(!ApiErrorCode::AuthFailed.is_retryable());
        assert!(!ApiErrorCode::InvalidRequest.is_retryable());
    }

    #[test]
    fn test_api_error_serializes_to_camel_case() {
        let mut err = ApiError::new(ApiErrorCode::RateLimited, "slow down", "req-1");
        err.upstream_status = Some(429);
        err.retry_after_sec = Some(30);

        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(
            value,
            json!({
                "code": "RATE_LIMITED",
                "message": "slow down",
                "requestId": "req-1",
                "status": 429,
                "upstreamStatus": 429,
                "retryAfterSec": 30
            })
        );
    }

    #[test]
    fn test_api_error_response_status_and_header() {
        let mut err = ApiError::new(ApiErrorCode::RateLimited, "slow down", "req-2");
        err.retry_after_sec = Some(12);
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "12");

        let response = ApiError::new(ApiErrorCode::NotAvailable, "nope", "req-3").into_response();
        assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
    }
}
