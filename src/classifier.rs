//! Upstream failure classification
//!
//! Maps every [`ServiceError`] onto the six-code [`ApiError`] taxonomy. All services route
//! their failures through [`classify`], so failure semantics are identical across
//! resource types.

use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde_json::Value;
use tracing::error;

use crate::error::{ApiError, ApiErrorCode, ServiceError};
use crate::upstream::UpstreamFailure;

/// Code for an upstream HTTP status; `0` is a transport failure.
#[must_use]
pub fn code_for_status(status: u16) -> ApiErrorCode {
    match status {
        400 => ApiErrorCode::InvalidRequest,
        401 => ApiErrorCode::AuthFailed,
        // capability not enabled for this account/environment
        403 | 404 => ApiErrorCode::NotAvailable,
        429 => ApiErrorCode::RateLimited,
        0 | 500..=599 => ApiErrorCode::UpstreamError,
        _ => ApiErrorCode::InternalError,
    }
}

/// Classify any service failure for the caller identified by `request_id`
pub fn classify(err: &ServiceError, request_id: &str) -> ApiError {
    match err {
        ServiceError::Upstream(failure) => classify_upstream(failure, request_id, Utc::now()),
        ServiceError::Unresolved { .. } => {
            ApiError::new(ApiErrorCode::InvalidRequest, err.to_string(), request_id)
        }
        ServiceError::Internal(cause) => {
            error!(request_id, error = ?cause, "Internal gateway failure");
            let code = ApiErrorCode::InternalError;
            ApiError::new(code, code.default_message(), request_id)
        }
    }
}

#[must_use]
pub fn is_retryable(err: &ServiceError) -> bool {
    match err {
        ServiceError::Upstream(failure) => code_for_status(failure.status).is_retryable(),
        ServiceError::Unresolved { .. } | ServiceError::Internal(_) => false,
    }
}

fn classify_upstream(failure: &UpstreamFailure, request_id: &str, now: DateTime<Utc>) -> ApiError {
    let code = code_for_status(failure.status);
    let message = failure
        .parsed_body
        .as_ref()
        .and_then(upstream_message)
        .unwrap_or_else(|| code.default_message().to_string());

    let mut api_error = ApiError::new(code, message, request_id);

    if !failure.is_transport() {
        api_error.upstream_status = Some(failure.status);
    }
    if code == ApiErrorCode::RateLimited {
        api_error.retry_after_sec = retry_after_seconds(&failure.headers, now);
    }
    api_error.details = upstream_details(failure);

    api_error
}

/// First human-readable message in an upstream error body
fn upstream_message(body: &Value) -> Option<String> {
    let first_error = body
        .get("errors")
        .and_then(Value::as_array)
        .and_then(|errors| errors.first());

    let candidates = [
        first_error.and_then(|e| e.get("detail")),
        first_error.and_then(|e| e.get("title")),
        body.get("error_description"),
        body.get("message"),
    ];

    candidates
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// Opaque diagnostic payload: the upstream `errors` array, the whole parsed body, or the raw text
fn upstream_details(failure: &UpstreamFailure) -> Option<Value> {
    match &failure.parsed_body {
        Some(body) => Some(body.get("errors").cloned().unwrap_or_else(|| body.clone())),
        None if failure.raw_body.trim().is_empty() => None,
        None => Some(Value::String(failure.raw_body.clone())),
    }
}

/// `Retry-After` as seconds; accepts delta-seconds or an HTTP-date.
pub fn retry_after_seconds(headers: &HeaderMap, now: DateTime<Utc>) -> Option<u64> {
    let raw = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();

    if let Ok(seconds) = raw.parse::<u64>() {
        return Some(seconds);
    }

    let at = DateTime::parse_from_rfc2822(raw).ok()?;
    let delta = at.with_timezone(&Utc).signed_duration_since(now).num_seconds();
    Some(delta.max(0) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use reqwest::header::HeaderValue;
    use rstest::rstest;
    use serde_json::json;

    fn failure(status: u16, body: &str) -> UpstreamFailure {
        UpstreamFailure::from_response(status, HeaderMap::new(), body.to_string())
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2015, 10, 21, 7, 27, 0).unwrap()
    }

    #[rstest]
    #[case(400, ApiErrorCode::InvalidRequest, 400)]
    #[case(401, ApiErrorCode::AuthFailed, 401)]
    #[case(403, ApiErrorCode::NotAvailable, 501)]
    #[case(404, ApiErrorCode::NotAvailable, 501)]
    #[case(429, ApiErrorCode::RateLimited, 429)]
    #[case(500, ApiErrorCode::UpstreamError, 502)]
    #[case(503, ApiErrorCode::UpstreamError, 502)]
    #[case(599, ApiErrorCode::UpstreamError, 502)]
    #[case(0, ApiErrorCode::UpstreamError, 502)]
    #[case(409, ApiErrorCode::InternalError, 500)]
    #[case(302, ApiErrorCode::InternalError, 500)]
    fn test_status_table(#[case] upstream: u16, #[case] code: ApiErrorCode, #[case] returned: u16) {
        let err = ServiceError::Upstream(failure(upstream, ""));
        let api_error = classify(&err, "req-1");
        assert_eq!(api_error.code, code);
        assert_eq!(api_error.status, returned);
        assert_eq!(api_error.request_id, "req-1");
    }

    #[rstest]
    #[case("")]
    #[case("not json at all")]
    #[case(r#"{"errors":[{"code":38190,"title":"Invalid access token"}]}"#)]
    #[case(r#"{"unexpected":{"nested":[1,2,3]}}"#)]
    fn test_401_is_auth_failed_regardless_of_body(#[case] body: &str) {
        let api_error = classify(&ServiceError::Upstream(failure(401, body)), "req-1");
        assert_eq!(api_error.code, ApiErrorCode::AuthFailed);
        assert_eq!(api_error.status, 401);
        assert_eq!(api_error.upstream_status, Some(401));
    }

    #[test]
    fn test_retry_after_seconds_header() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("30"));
        let failure = UpstreamFailure::from_response(429, headers, String::new());

        let api_error = classify(&ServiceError::Upstream(failure), "req-1");
        assert_eq!(api_error.code, ApiErrorCode::RateLimited);
        assert_eq!(api_error.retry_after_sec, Some(30));
    }

    #[test]
    fn test_retry_after_http_date() {
        let mut headers = HeaderMap::new();
        headers.insert(
            RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        assert_eq!(retry_after_seconds(&headers, now()), Some(60));

        headers.insert(
            RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2015 07:00:00 GMT"),
        );
        assert_eq!(retry_after_seconds(&headers, now()), Some(0));
    }

    #[test]
    fn test_retry_after_absent_or_garbage() {
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after_seconds(&headers, now()), None);

        headers.insert(RETRY_AFTER, HeaderValue::from_static("soon"));
        assert_eq!(retry_after_seconds(&headers, now()), None);
    }

    #[test]
    fn test_retry_after_only_read_for_rate_limits() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("30"));
        let failure = UpstreamFailure::from_response(503, headers, String::new());
        let api_error = classify(&ServiceError::Upstream(failure), "req-1");
        assert_eq!(api_error.retry_after_sec, None);
    }

    #[test]
    fn test_message_and_details_from_upstream_errors() {
        let body = json!({
            "errors": [{
                "status": 400,
                "code": 477,
                "title": "INVALID FORMAT",
                "detail": "keyword must be at least 1 character"
            }]
        });
        let api_error = classify(
            &ServiceError::Upstream(failure(400, &body.to_string())),
            "req-1",
        );
        assert_eq!(api_error.message, "keyword must be at least 1 character");
        assert_eq!(api_error.details, Some(body["errors"].clone()));
    }

    #[test]
    fn test_message_falls_back_to_title_then_default() {
        let api_error = classify(
            &ServiceError::Upstream(failure(404, r#"{"errors":[{"title":"NOT FOUND"}]}"#)),
            "req-1",
        );
        assert_eq!(api_error.message, "NOT FOUND");

        let api_error = classify(&ServiceError::Upstream(failure(404, "")), "req-1");
        assert_eq!(api_error.message, ApiErrorCode::NotAvailable.default_message());
        assert_eq!(api_error.details, None);
    }

    #[test]
    fn test_raw_body_kept_as_opaque_details() {
        let api_error = classify(
            &ServiceError::Upstream(failure(502, "<html>Bad Gateway</html>")),
            "req-1",
        );
        assert_eq!(api_error.details, Some(json!("<html>Bad Gateway</html>")));
    }

    #[test]
    fn test_transport_failure_has_no_upstream_status() {
        let failure = UpstreamFailure {
            status: 0,
            headers: HeaderMap::new(),
            raw_body: "timeout: operation timed out".to_string(),
            parsed_body: None,
        };
        let api_error = classify(&ServiceError::Upstream(failure), "req-1");
        assert_eq!(api_error.code, ApiErrorCode::UpstreamError);
        assert_eq!(api_error.status, 502);
        assert_eq!(api_error.upstream_status, None);
    }

    #[test]
    fn test_unresolved_keyword_is_invalid_request() {
        let api_error = classify(&ServiceError::unresolved("Atlantis", "coordinate"), "req-1");
        assert_eq!(api_error.code, ApiErrorCode::InvalidRequest);
        assert_eq!(api_error.status, 400);
        assert!(api_error.message.contains("Atlantis"));
    }

    #[test]
    fn test_internal_errors_hide_their_cause() {
        let err = ServiceError::Internal(anyhow::anyhow!("secret stack detail"));
        let api_error = classify(&err, "req-1");
        assert_eq!(api_error.code, ApiErrorCode::InternalError);
        assert_eq!(api_error.status, 500);
        assert!(!api_error.message.contains("secret"));
        assert!(api_error.details.is_none());
    }

    #[test]
    fn test_retryability() {
        assert!(is_retryable(&ServiceError::Upstream(failure(429, ""))));
        assert!(is_retryable(&ServiceError::Upstream(failure(500, ""))));
        assert!(!is_retryable(&ServiceError::Upstream(failure(404, ""))));
        assert!(!is_retryable(&ServiceError::unresolved("x", "coordinate")));
    }
}
