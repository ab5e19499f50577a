use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

use super::envelope::{ApiResult, Envelope};
use super::request_id::RequestId;
use super::validation::{Validator, query_or_reject};
use super::{AppState, classified};
use crate::models::{Location, Poi};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationsQuery {
    keyword: Option<String>,
    sub_type: Option<String>,
    country_code: Option<String>,
    page_limit: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CitiesQuery {
    keyword: Option<String>,
    country_code: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PoisQuery {
    lat: Option<String>,
    lng: Option<String>,
    radius: Option<String>,
    categories: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationsQuery {
    city_code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LocationsPayload {
    locations: Vec<Location>,
}

#[derive(Debug, Serialize)]
pub struct PoisPayload {
    pois: Vec<Poi>,
}

pub async fn search_locations(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    query: Result<Query<LocationsQuery>, QueryRejection>,
) -> ApiResult<LocationsPayload> {
    let query = query_or_reject(query, &request_id)?;

    let mut check = Validator::new();
    let keyword = check.text("keyword", query.keyword.as_deref(), 1);
    let sub_type = check.optional_text("subType", query.sub_type.as_deref(), 1);
    let country_code = check.optional_exact("countryCode", query.country_code.as_deref(), 2);
    let page_limit = check.optional_number::<u32>("pageLimit", query.page_limit.as_deref(), 1, 100);
    let (Some(keyword), true) = (keyword, check.is_clean()) else {
        return Err(check.into_error(&request_id));
    };

    let locations = state
        .services
        .content
        .search_locations(keyword, sub_type, country_code, page_limit, &request_id)
        .await
        .map_err(classified(&request_id))?;

    Ok(Envelope::new(&request_id, LocationsPayload { locations }))
}

pub async fn search_cities(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    query: Result<Query<CitiesQuery>, QueryRejection>,
) -> ApiResult<LocationsPayload> {
    let query = query_or_reject(query, &request_id)?;

    let mut check = Validator::new();
    let keyword = check.text("keyword", query.keyword.as_deref(), 1);
    let country_code = check.optional_exact("countryCode", query.country_code.as_deref(), 2);
    let (Some(keyword), true) = (keyword, check.is_clean()) else {
        return Err(check.into_error(&request_id));
    };

    let locations = state
        .services
        .content
        .search_cities(keyword, country_code, &request_id)
        .await
        .map_err(classified(&request_id))?;

    Ok(Envelope::new(&request_id, LocationsPayload { locations }))
}

pub async fn pois_by_radius(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    query: Result<Query<PoisQuery>, QueryRejection>,
) -> ApiResult<PoisPayload> {
    let query = query_or_reject(query, &request_id)?;

    let mut check = Validator::new();
    let lat = check.number("lat", query.lat.as_deref(), -90.0, 90.0);
    let lng = check.number("lng", query.lng.as_deref(), -180.0, 180.0);
    let radius = check.optional_number("radius", query.radius.as_deref(), 0.1, 50.0);
    let (Some(lat), Some(lng), true) = (lat, lng, check.is_clean()) else {
        return Err(check.into_error(&request_id));
    };

    let categories: Vec<String> = query
        .categories
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_ascii_uppercase)
        .collect();

    let pois = state
        .services
        .content
        .pois_by_radius(lat, lng, radius, &categories, &request_id)
        .await
        .map_err(classified(&request_id))?;

    Ok(Envelope::new(&request_id, PoisPayload { pois }))
}

pub async fn recommended_locations(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    query: Result<Query<RecommendationsQuery>, QueryRejection>,
) -> ApiResult<LocationsPayload> {
    let query = query_or_reject(query, &request_id)?;

    let mut check = Validator::new();
    let (Some(city_code), true) = (
        check.exact("cityCode", query.city_code.as_deref(), 3),
        check.is_clean(),
    ) else {
        return Err(check.into_error(&request_id));
    };

    let locations = state
        .services
        .content
        .recommended_locations(city_code, &request_id)
        .await
        .map_err(classified(&request_id))?;

    Ok(Envelope::new(&request_id, LocationsPayload { locations }))
}
