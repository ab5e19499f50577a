//! Location and point-of-interest models

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Geo, UpstreamGeoCode, id_text, non_empty};

/// Kind of place a location refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationSubtype {
    City,
    Airport,
    Other,
}

impl LocationSubtype {
    /// Parse upstream spellings (`CITY`, `city`, `AIRPORT`, ...)
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_uppercase()).as_deref() {
            Some("CITY") => LocationSubtype::City,
            Some("AIRPORT") => LocationSubtype::Airport,
            _ => LocationSubtype::Other,
        }
    }
}

/// A city, airport, or other place known to the upstream
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: String,
    pub name: String,
    pub subtype: LocationSubtype,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iata_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo: Option<Geo>,
}

/// Point of interest near a coordinate
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Poi {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo: Option<Geo>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpstreamAddress {
    city_code: Option<String>,
    city_name: Option<String>,
    country_code: Option<String>,
}

/// Entry of the locations, cities, or recommended-locations `data[]`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpstreamLocation {
    id: Option<Value>,
    name: Option<String>,
    detailed_name: Option<String>,
    #[serde(alias = "subtype")]
    sub_type: Option<String>,
    iata_code: Option<String>,
    address: Option<UpstreamAddress>,
    geo_code: Option<UpstreamGeoCode>,
}

impl UpstreamLocation {
    /// Normalize; `None` when the entry has no name and no code at all
    #[must_use]
    pub fn into_location(self) -> Option<Location> {
        let address = self.address.unwrap_or_default();
        let iata_code = non_empty(self.iata_code).map(|c| c.to_ascii_uppercase());
        let city_code = non_empty(address.city_code).map(|c| c.to_ascii_uppercase());
        let name = non_empty(self.name)
            .or_else(|| non_empty(self.detailed_name))
            .or_else(|| non_empty(address.city_name));

        if iata_code.is_none() && city_code.is_none() && name.is_none() {
            return None;
        }

        let id = id_text(self.id.as_ref())
            .or_else(|| iata_code.clone())
            .or_else(|| city_code.clone())
            .or_else(|| name.clone())
            .unwrap_or_default();

        Some(Location {
            id,
            name: name
                .or_else(|| iata_code.clone())
                .or_else(|| city_code.clone())
                .unwrap_or_default(),
            subtype: LocationSubtype::parse(self.sub_type.as_deref()),
            iata_code,
            city_code,
            country_code: non_empty(address.country_code).map(|c| c.to_ascii_uppercase()),
            geo: self.geo_code.as_ref().and_then(UpstreamGeoCode::to_geo),
        })
    }
}

/// Entry of the points-of-interest `data[]`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpstreamPoi {
    id: Option<Value>,
    name: Option<String>,
    category: Option<String>,
    tags: Option<Vec<Value>>,
    geo_code: Option<UpstreamGeoCode>,
}

impl UpstreamPoi {
    /// Normalize; `None` when the entry has no name
    #[must_use]
    pub fn into_poi(self) -> Option<Poi> {
        let name = non_empty(self.name)?;
        let tags = self
            .tags
            .unwrap_or_default()
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect();

        Some(Poi {
            id: id_text(self.id.as_ref()).unwrap_or_else(|| name.clone()),
            name,
            category: non_empty(self.category),
            tags,
            geo: self.geo_code.as_ref().and_then(UpstreamGeoCode::to_geo),
        })
    }
}
