use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use serde::Deserialize;

use super::envelope::{ApiResult, Envelope};
use super::request_id::RequestId;
use super::validation::{Validator, query_or_reject};
use super::{AppState, classified};
use crate::services::ActivitySearchResult;

#[derive(Debug, Default, Deserialize)]
pub struct ActivitiesQuery {
    keyword: Option<String>,
    radius: Option<String>,
    limit: Option<String>,
}

pub async fn search_activities(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    query: Result<Query<ActivitiesQuery>, QueryRejection>,
) -> ApiResult<ActivitySearchResult> {
    let query = query_or_reject(query, &request_id)?;

    let mut check = Validator::new();
    let keyword = check.text("keyword", query.keyword.as_deref(), 2);
    let radius = check.optional_number("radius", query.radius.as_deref(), 0.1, 20.0);
    let limit = check.optional_number::<usize>("limit", query.limit.as_deref(), 1, 50);
    let (Some(keyword), true) = (keyword, check.is_clean()) else {
        return Err(check.into_error(&request_id));
    };

    let result = state
        .services
        .activities
        .search_activities(keyword, radius, limit, &request_id)
        .await
        .map_err(classified(&request_id))?;

    Ok(Envelope::new(&request_id, result))
}
