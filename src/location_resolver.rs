//! Location Resolution Module
//!
//! Turns free-text place names into what the upstream sub-APIs need: a location code
//! for car rental and transfers, a coordinate for activities. Stages run one after
//! another and stop at the first hit.

use tracing::debug;

use crate::error::ServiceError;
use crate::models::{Geo, Location};
use crate::services::ContentService;

/// Resolves keywords against the upstream reference data
#[derive(Clone)]
pub struct KeywordResolver {
    content: ContentService,
}

/// Exactly three ASCII uppercase letters, e.g. `MIA`
#[must_use]
pub fn is_location_code(keyword: &str) -> bool {
    keyword.len() == 3 && keyword.bytes().all(|b| b.is_ascii_uppercase())
}

impl KeywordResolver {
    pub fn new(content: ContentService) -> Self {
        Self { content }
    }

    /// Resolve a keyword to a location code.
    ///
    /// Code-shaped input is returned unchanged without any upstream call. `None` means
    /// nothing with a code matched.
    pub async fn resolve_location_code(
        &self,
        keyword: &str,
        request_id: &str,
    ) -> Result<Option<String>, ServiceError> {
        let keyword = keyword.trim();
        if is_location_code(keyword) {
            debug!(request_id, keyword, "Keyword is already a location code");
            return Ok(Some(keyword.to_string()));
        }

        if let Some(code) = self.code_from_cities(keyword, request_id).await? {
            debug!(request_id, keyword, %code, "Resolved keyword from city search");
            return Ok(Some(code));
        }

        if let Some(code) = self.code_from_cities_and_airports(keyword, request_id).await? {
            debug!(request_id, keyword, %code, "Resolved keyword from city/airport search");
            return Ok(Some(code));
        }

        debug!(request_id, keyword, "Keyword did not resolve to a location code");
        Ok(None)
    }

    /// Resolve a keyword to a coordinate, or fail with an unresolved-keyword error
    pub async fn resolve_geo(&self, keyword: &str, request_id: &str) -> Result<Geo, ServiceError> {
        let keyword = keyword.trim();

        if let Some(geo) = self.geo_from_cities(keyword, request_id).await? {
            debug!(request_id, keyword, lat = geo.lat, lng = geo.lng, "Resolved coordinates from city search");
            return Ok(geo);
        }

        if let Some(geo) = self.geo_from_locations(keyword, request_id).await? {
            debug!(request_id, keyword, lat = geo.lat, lng = geo.lng, "Resolved coordinates from location search");
            return Ok(geo);
        }

        Err(ServiceError::unresolved(keyword, "coordinate"))
    }

    async fn code_from_cities(
        &self,
        keyword: &str,
        request_id: &str,
    ) -> Result<Option<String>, ServiceError> {
        let locations = self
            .content
            .search_locations(keyword, Some("CITY"), None, None, request_id)
            .await?;
        Ok(pick_code(&locations))
    }

    async fn code_from_cities_and_airports(
        &self,
        keyword: &str,
        request_id: &str,
    ) -> Result<Option<String>, ServiceError> {
        let locations = self
            .content
            .search_locations(keyword, Some("CITY,AIRPORT"), None, None, request_id)
            .await?;
        Ok(pick_code(&locations))
    }

    async fn geo_from_cities(&self, keyword: &str, request_id: &str) -> Result<Option<Geo>, ServiceError> {
        let cities = self.content.search_cities(keyword, None, request_id).await?;
        Ok(first_geo(&cities))
    }

    async fn geo_from_locations(
        &self,
        keyword: &str,
        request_id: &str,
    ) -> Result<Option<Geo>, ServiceError> {
        let locations = self
            .content
            .search_locations(keyword, Some("CITY"), None, None, request_id)
            .await?;
        Ok(first_geo(&locations))
    }
}

/// First IATA code, else first city code
fn pick_code(locations: &[Location]) -> Option<String> {
    locations
        .iter()
        .find_map(|l| l.iata_code.clone())
        .or_else(|| locations.iter().find_map(|l| l.city_code.clone()))
}

fn first_geo(locations: &[Location]) -> Option<Geo> {
    locations.iter().find_map(|l| l.geo)
}
