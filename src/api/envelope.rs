//! Success envelope shared by every route

use axum::Json;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::error::ApiError;

/// `{ ok: true, requestId, ...payload }`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    ok: bool,
    request_id: String,
    #[serde(flatten)]
    payload: T,
}

impl<T: Serialize> Envelope<T> {
    pub fn new(request_id: &str, payload: T) -> Self {
        Self {
            ok: true,
            request_id: request_id.to_string(),
            payload,
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

pub type ApiResult<T> = Result<Envelope<T>, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Payload {
        locations: Vec<&'static str>,
    }

    #[test]
    fn test_payload_is_flattened() {
        let envelope = Envelope::new("req-1", Payload { locations: vec!["PAR"] });
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({"ok": true, "requestId": "req-1", "locations": ["PAR"]})
        );
    }
}
