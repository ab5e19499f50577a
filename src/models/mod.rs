//! Normalized data models for the gateway
//!
//! Each resource module holds the outbound DTO and the loosely-typed upstream shape it is
//! mapped from. Upstream shapes deserialize with every field optional so that a missing
//! field on one result never fails a whole search:
//! - Location / Poi: reference data (locations, cities, points of interest)
//! - Offers: car-rental and transfer offers
//! - Activity: tours and activities

pub mod activity;
pub mod location;
pub mod offers;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::upstream::data_items;

// Re-export all public types for convenient access
pub use activity::Activity;
pub use location::{Location, LocationSubtype, Poi};
pub use offers::{CarOffer, CarVehicle, TransferOffer, TransferVehicle};

/// Geographic point in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Geo {
    pub lat: f64,
    pub lng: f64,
}

impl Geo {
    #[must_use]
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Monetary amount
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Price {
    pub amount: f64,
    pub currency: String,
}

/// Amount field names in the order they are tried; suppliers disagree on naming
const PRICE_AMOUNT_FIELDS: [&str; 4] = ["amount", "total", "grandTotal", "monetaryAmount"];
const PRICE_CURRENCY_FIELDS: [&str; 2] = ["currency", "currencyCode"];

impl Price {
    /// Map an upstream price object, tolerating amounts sent as strings
    #[must_use]
    pub fn from_upstream(raw: &Value) -> Option<Self> {
        let amount = PRICE_AMOUNT_FIELDS
            .iter()
            .find_map(|field| raw.get(field).and_then(number))?;
        let currency = PRICE_CURRENCY_FIELDS
            .iter()
            .find_map(|field| raw.get(field).and_then(Value::as_str))
            .map(str::trim)
            .filter(|s| !s.is_empty())?;

        Some(Self {
            amount,
            currency: currency.to_string(),
        })
    }
}

/// Upstream `geoCode` object
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpstreamGeoCode {
    latitude: Option<Value>,
    longitude: Option<Value>,
}

impl UpstreamGeoCode {
    /// A point only when both coordinates are present and in range
    #[must_use]
    pub fn to_geo(&self) -> Option<Geo> {
        let lat = self.latitude.as_ref().and_then(number)?;
        let lng = self.longitude.as_ref().and_then(number)?;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return None;
        }
        Some(Geo::new(lat, lng))
    }
}

/// Number from a JSON number or numeric string
pub(crate) fn number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|n| n.is_finite())
}

/// Identifier from a JSON string or number
pub(crate) fn id_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => non_empty(Some(s.clone())),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Deserialize each element of `data[]`, skipping (and logging) the ones that do not fit
pub(crate) fn decode_items<T: DeserializeOwned>(
    body: &Value,
    resource: &str,
    request_id: &str,
) -> Vec<T> {
    data_items(body)
        .iter()
        .enumerate()
        .filter_map(|(index, item)| match T::deserialize(item) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!(request_id, resource, index, error = %e, "Skipping malformed upstream item");
                None
            }
        })
        .collect()
}
