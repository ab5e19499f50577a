use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::envelope::{ApiResult, Envelope};
use super::request_id::RequestId;
use super::validation::{Validator, query_or_reject};
use super::{AppState, classified};
use crate::models::TransferOffer;
use crate::services::{TransferBooking, TransferSearch};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferSearchQuery {
    origin: Option<String>,
    destination: Option<String>,
    date_time: Option<String>,
    passengers: Option<String>,
    currency: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OffersPayload {
    offers: Vec<TransferOffer>,
}

#[derive(Debug, Serialize)]
pub struct CancellationPayload {
    result: Value,
}

pub async fn search_transfers(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    query: Result<Query<TransferSearchQuery>, QueryRejection>,
) -> ApiResult<OffersPayload> {
    let query = query_or_reject(query, &request_id)?;

    let mut check = Validator::new();
    let origin = check.text("origin", query.origin.as_deref(), 3);
    let destination = check.text("destination", query.destination.as_deref(), 3);
    let date_time = check.text("dateTime", query.date_time.as_deref(), 10);
    let passengers = check.optional_number::<u32>("passengers", query.passengers.as_deref(), 1, 9);
    let currency = check.optional_exact("currency", query.currency.as_deref(), 3);

    let (Some(origin), Some(destination), Some(date_time), true) =
        (origin, destination, date_time, check.is_clean())
    else {
        return Err(check.into_error(&request_id));
    };

    let search = TransferSearch {
        origin: origin.to_string(),
        destination: destination.to_string(),
        date_time: date_time.to_string(),
        passengers,
        currency: currency.map(str::to_string),
    };

    let offers = state
        .services
        .transfers
        .search_transfers(&search, &request_id)
        .await
        .map_err(classified(&request_id))?;

    Ok(Envelope::new(&request_id, OffersPayload { offers }))
}

/// `{ data: {...}, offerId? }`; only `{ data }` is forwarded
pub async fn book_transfer(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<TransferBooking> {
    let mut check = Validator::new();
    let request = buffered_body(&mut check, body).and_then(|body| json_body(&mut check, &body, false));

    let data = request.as_ref().and_then(|r| r.get("data"));
    if request.is_some() && !data.is_some_and(Value::is_object) {
        check.issue("data", "must be an object");
    }

    let offer_id = match request.as_ref().and_then(|r| r.get("offerId")) {
        None | Some(Value::Null) => None,
        Some(Value::String(id)) if !id.trim().is_empty() => Some(id.trim().to_string()),
        Some(_) => {
            check.issue("offerId", "must be a non-empty string");
            None
        }
    };

    let (Some(data), true) = (data, check.is_clean()) else {
        return Err(check.into_error(&request_id));
    };

    let payload = json!({ "data": data });
    let booking = state
        .services
        .transfers
        .book_transfer(&payload, offer_id.as_deref(), &request_id)
        .await
        .map_err(classified(&request_id))?;

    Ok(Envelope::new(&request_id, booking))
}

/// Forward the caller's payload to the cancellation endpoint as-is
pub async fn cancel_transfer(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    Path(order_id): Path<String>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<CancellationPayload> {
    let mut check = Validator::new();
    let order_id = check.text("orderId", Some(order_id.as_str()), 1);
    let payload = buffered_body(&mut check, body).and_then(|body| json_body(&mut check, &body, true));

    let (Some(order_id), Some(payload), true) = (order_id, payload, check.is_clean()) else {
        return Err(check.into_error(&request_id));
    };

    let result = state
        .services
        .transfers
        .cancel_transfer(order_id, &payload, &request_id)
        .await
        .map_err(classified(&request_id))?;

    Ok(Envelope::new(&request_id, CancellationPayload { result }))
}

/// An oversized or unreadable body becomes a `body` issue instead of a bare rejection
fn buffered_body(check: &mut Validator, body: Result<Bytes, BytesRejection>) -> Option<Bytes> {
    match body {
        Ok(body) => Some(body),
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            check.issue("body", "exceeds the maximum accepted size");
            None
        }
        Err(rejection) => {
            check.issue("body", format!("could not be read: {}", rejection.body_text()));
            None
        }
    }
}

/// Parse a JSON object body; an empty body counts as `{}` when `allow_empty`
fn json_body(check: &mut Validator, body: &[u8], allow_empty: bool) -> Option<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        if allow_empty {
            return Some(json!({}));
        }
        check.issue("body", "is required");
        return None;
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(value) if value.is_object() => Some(value),
        Ok(_) => {
            check.issue("body", "must be a JSON object");
            None
        }
        Err(e) => {
            check.issue("body", format!("is not valid JSON: {e}"));
            None
        }
    }
}
