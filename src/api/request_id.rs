//! Request id extraction
//!
//! The id is normally stamped on the request by `SetRequestIdLayer`; when the router runs
//! without that layer a fresh UUID is generated so every response still carries one.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    fn from_parts(parts: &Parts) -> Option<String> {
        let stamped = parts
            .extensions
            .get::<tower_http::request_id::RequestId>()
            .and_then(|id| id.header_value().to_str().ok());
        let header = parts
            .headers
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok());

        stamped
            .or(header)
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
    }
}

impl<S> FromRequestParts<S> for RequestId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = Self::from_parts(parts).unwrap_or_else(|| Uuid::new_v4().to_string());
        Ok(Self(id))
    }
}
