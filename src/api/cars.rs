use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use serde::Deserialize;
use serde_json::json;

use super::envelope::{ApiResult, Envelope};
use super::request_id::RequestId;
use super::validation::{Validator, query_or_reject};
use super::{AppState, classified};
use crate::error::{ApiError, ApiErrorCode};
use crate::services::CarSearchResult;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarSearchQuery {
    pickup: Option<String>,
    dropoff: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    age: Option<String>,
}

pub async fn search_cars(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    query: Result<Query<CarSearchQuery>, QueryRejection>,
) -> ApiResult<CarSearchResult> {
    let query = query_or_reject(query, &request_id)?;

    let mut check = Validator::new();
    let pickup = check.text("pickup", query.pickup.as_deref(), 3);
    let dropoff = check.optional_text("dropoff", query.dropoff.as_deref(), 3);
    let start_date = check.date("startDate", query.start_date.as_deref());
    let end_date = check.date("endDate", query.end_date.as_deref());
    let age = check.optional_number::<u32>("age", query.age.as_deref(), 18, 99);

    if let (Some(start), Some(end)) = (start_date, end_date) {
        if end < start {
            check.issue("endDate", "must not be before startDate");
        }
    }

    let (Some(pickup), Some(start_date), Some(end_date), true) =
        (pickup, start_date, end_date, check.is_clean())
    else {
        return Err(check.into_error(&request_id));
    };

    let result = state
        .services
        .cars
        .search_cars(pickup, dropoff, start_date, end_date, age, &request_id)
        .await
        .map_err(classified(&request_id))?;

    Ok(Envelope::new(&request_id, result))
}

/// Always answers 501; the body, if any, is never read
pub async fn book_car(State(state): State<AppState>, RequestId(request_id): RequestId) -> ApiError {
    let outcome = state.services.cars.book_car(&request_id);
    ApiError::new(ApiErrorCode::NotAvailable, outcome.guidance.clone(), &request_id)
        .with_details(json!(outcome))
}
