//! Reference-data content: locations, cities, points of interest, recommendations

use tracing::{debug, info};

use crate::config::DefaultsConfig;
use crate::error::ServiceError;
use crate::models::location::{UpstreamLocation, UpstreamPoi};
use crate::models::{Location, Poi, decode_items};
use crate::upstream::{RetryPolicy, UpstreamClient};

pub const LOCATIONS_PATH: &str = "/v1/reference-data/locations";
pub const CITIES_PATH: &str = "/v1/reference-data/locations/cities";
pub const POIS_PATH: &str = "/v1/reference-data/locations/pois";
pub const RECOMMENDATIONS_PATH: &str = "/v1/reference-data/recommended-locations";

/// Sub-type filter used when the caller gives none
pub const DEFAULT_SUB_TYPE: &str = "CITY,AIRPORT";

#[derive(Clone)]
pub struct ContentService {
    client: UpstreamClient,
    retry: RetryPolicy,
    page_limit: u32,
    poi_radius_km: f64,
}

impl ContentService {
    pub fn new(client: UpstreamClient, retry: RetryPolicy, defaults: &DefaultsConfig) -> Self {
        Self {
            client,
            retry,
            page_limit: defaults.location_page_limit,
            poi_radius_km: defaults.poi_radius_km,
        }
    }

    /// Airports and cities matching a keyword
    pub async fn search_locations(
        &self,
        keyword: &str,
        sub_type: Option<&str>,
        country_code: Option<&str>,
        page_limit: Option<u32>,
        request_id: &str,
    ) -> Result<Vec<Location>, ServiceError> {
        let mut query = vec![
            ("keyword", keyword.to_string()),
            ("subType", sub_type.unwrap_or(DEFAULT_SUB_TYPE).to_string()),
            ("page[limit]", page_limit.unwrap_or(self.page_limit).to_string()),
        ];
        if let Some(country) = country_code {
            query.push(("countryCode", country.to_string()));
        }

        debug!(request_id, keyword, ?sub_type, "Searching locations");
        let body = self
            .retry
            .run(request_id, || self.client.get(LOCATIONS_PATH, &query, request_id))
            .await?;

        let locations = normalize_locations(&body, request_id);
        info!(request_id, keyword, count = locations.len(), "Location search complete");
        Ok(locations)
    }

    /// Cities matching a keyword
    pub async fn search_cities(
        &self,
        keyword: &str,
        country_code: Option<&str>,
        request_id: &str,
    ) -> Result<Vec<Location>, ServiceError> {
        let mut query = vec![
            ("keyword", keyword.to_string()),
            ("max", self.page_limit.to_string()),
        ];
        if let Some(country) = country_code {
            query.push(("countryCode", country.to_string()));
        }

        debug!(request_id, keyword, "Searching cities");
        let body = self
            .retry
            .run(request_id, || self.client.get(CITIES_PATH, &query, request_id))
            .await?;

        let locations = normalize_locations(&body, request_id);
        info!(request_id, keyword, count = locations.len(), "City search complete");
        Ok(locations)
    }

    /// Points of interest within `radius` km of a point
    pub async fn pois_by_radius(
        &self,
        lat: f64,
        lng: f64,
        radius: Option<f64>,
        categories: &[String],
        request_id: &str,
    ) -> Result<Vec<Poi>, ServiceError> {
        let mut query = vec![
            ("latitude", lat.to_string()),
            ("longitude", lng.to_string()),
            ("radius", radius.unwrap_or(self.poi_radius_km).to_string()),
        ];
        if !categories.is_empty() {
            query.push(("categories", categories.join(",")));
        }

        let body = self
            .retry
            .run(request_id, || self.client.get(POIS_PATH, &query, request_id))
            .await?;

        let pois: Vec<Poi> = decode_items::<UpstreamPoi>(&body, "poi", request_id)
            .into_iter()
            .filter_map(UpstreamPoi::into_poi)
            .collect();

        info!(request_id, lat, lng, count = pois.len(), "POI search complete");
        Ok(pois)
    }

    /// Destinations the upstream recommends for travellers from `city_code`
    pub async fn recommended_locations(
        &self,
        city_code: &str,
        request_id: &str,
    ) -> Result<Vec<Location>, ServiceError> {
        let query = [("cityCodes", city_code.to_ascii_uppercase())];

        let body = self
            .retry
            .run(request_id, || {
                self.client.get(RECOMMENDATIONS_PATH, &query, request_id)
            })
            .await?;

        let locations = normalize_locations(&body, request_id);
        info!(request_id, city_code, count = locations.len(), "Recommendations complete");
        Ok(locations)
    }
}

fn normalize_locations(body: &serde_json::Value, request_id: &str) -> Vec<Location> {
    decode_items::<UpstreamLocation>(body, "location", request_id)
        .into_iter()
        .filter_map(UpstreamLocation::into_location)
        .collect()
}
