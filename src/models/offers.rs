//! Car-rental and transfer offer models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Price, id_text, non_empty, number};

/// Rental car offer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CarOffer {
    pub id: String,
    pub pickup_code: String,
    pub dropoff_code: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle: Option<CarVehicle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CarVehicle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transmission: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seats: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doors: Option<u32>,
}

/// Airport/city transfer offer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferOffer {
    pub id: String,
    pub origin: String,
    pub destination: String,
    pub date_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle: Option<TransferVehicle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransferVehicle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// What was actually asked upstream; fills gaps in offers that omit it
#[derive(Debug, Clone)]
pub struct CarQueryEcho<'a> {
    pub pickup_code: &'a str,
    pub dropoff_code: &'a str,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpstreamCarStop {
    location_code: Option<String>,
    date_time: Option<String>,
    date: Option<String>,
}

impl UpstreamCarStop {
    fn date(&self) -> Option<NaiveDate> {
        self.date_time
            .as_deref()
            .or(self.date.as_deref())
            .and_then(|s| s.get(..10))
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpstreamCarVehicle {
    name: Option<String>,
    description: Option<String>,
    category: Option<String>,
    acriss_code: Option<String>,
    transmission: Option<String>,
    #[serde(alias = "fuelType")]
    fuel: Option<String>,
    seats: Option<Value>,
    doors: Option<Value>,
}

impl UpstreamCarVehicle {
    fn into_vehicle(self) -> Option<CarVehicle> {
        let vehicle = CarVehicle {
            name: non_empty(self.name).or_else(|| non_empty(self.description)),
            category: non_empty(self.category).or_else(|| non_empty(self.acriss_code)),
            transmission: non_empty(self.transmission),
            fuel: non_empty(self.fuel),
            seats: self.seats.as_ref().and_then(count),
            doors: self.doors.as_ref().and_then(count),
        };
        (vehicle != CarVehicle::default()).then_some(vehicle)
    }
}

/// Seats/doors arrive as `5`, `"5"`, or `[{"count": 5}]`
fn count(value: &Value) -> Option<u32> {
    let raw = match value {
        Value::Array(items) => items.first().and_then(|first| first.get("count")).and_then(number),
        other => number(other),
    }?;
    (raw >= 0.0 && raw <= f64::from(u32::MAX)).then_some(raw as u32)
}

/// Entry of the car-offer search `data[]`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpstreamCarOffer {
    id: Option<Value>,
    #[serde(alias = "pickup")]
    pick_up: Option<UpstreamCarStop>,
    #[serde(alias = "dropoff")]
    drop_off: Option<UpstreamCarStop>,
    vehicle: Option<UpstreamCarVehicle>,
    price: Option<Value>,
    quotation: Option<Value>,
}

impl UpstreamCarOffer {
    /// Normalize; `None` when the offer ends before it starts
    #[must_use]
    pub fn into_car_offer(self, index: usize, query: &CarQueryEcho<'_>) -> Option<CarOffer> {
        let pick_up = self.pick_up.unwrap_or_default();
        let drop_off = self.drop_off.unwrap_or_default();

        let start_date = pick_up.date().unwrap_or(query.start_date);
        let end_date = drop_off.date().unwrap_or(query.end_date);
        if end_date < start_date {
            return None;
        }

        let pickup_code = non_empty(pick_up.location_code)
            .unwrap_or_else(|| query.pickup_code.to_string());

        Some(CarOffer {
            id: id_text(self.id.as_ref())
                .unwrap_or_else(|| format!("{pickup_code}-{start_date}-{index}")),
            dropoff_code: non_empty(drop_off.location_code)
                .unwrap_or_else(|| query.dropoff_code.to_string()),
            pickup_code,
            start_date,
            end_date,
            vehicle: self.vehicle.and_then(UpstreamCarVehicle::into_vehicle),
            price: self
                .price
                .as_ref()
                .or(self.quotation.as_ref())
                .and_then(Price::from_upstream),
        })
    }
}

/// What was asked for a transfer search
#[derive(Debug, Clone)]
pub struct TransferQueryEcho<'a> {
    pub origin: &'a str,
    pub destination: &'a str,
    pub date_time: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpstreamTransferAddress {
    line: Option<String>,
    city_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpstreamTransferStop {
    date_time: Option<String>,
    location_code: Option<String>,
    name: Option<String>,
    address: Option<UpstreamTransferAddress>,
}

impl UpstreamTransferStop {
    fn place(self) -> Option<String> {
        let address = self.address.unwrap_or_default();
        non_empty(self.location_code)
            .or_else(|| non_empty(self.name))
            .or_else(|| non_empty(address.city_name))
            .or_else(|| non_empty(address.line))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpstreamTransferVehicle {
    code: Option<String>,
    category: Option<String>,
    description: Option<String>,
}

/// Entry of the transfer search `data[]`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpstreamTransferOffer {
    id: Option<Value>,
    transfer_type: Option<String>,
    start: Option<UpstreamTransferStop>,
    end: Option<UpstreamTransferStop>,
    vehicle: Option<UpstreamTransferVehicle>,
    quotation: Option<Value>,
    price: Option<Value>,
}

impl UpstreamTransferOffer {
    #[must_use]
    pub fn into_transfer_offer(self, index: usize, query: &TransferQueryEcho<'_>) -> TransferOffer {
        let start = self.start.unwrap_or_default();
        let date_time =
            non_empty(start.date_time.clone()).unwrap_or_else(|| query.date_time.to_string());

        let vehicle = self.vehicle.map(|v| TransferVehicle {
            code: non_empty(v.code),
            category: non_empty(v.category),
            description: non_empty(v.description),
        });

        TransferOffer {
            id: id_text(self.id.as_ref()).unwrap_or_else(|| format!("transfer-{index}")),
            origin: start.place().unwrap_or_else(|| query.origin.to_string()),
            destination: self
                .end
                .and_then(UpstreamTransferStop::place)
                .unwrap_or_else(|| query.destination.to_string()),
            date_time,
            vehicle: vehicle.filter(|v| *v != TransferVehicle::default()),
            transfer_type: non_empty(self.transfer_type),
            price: self
                .quotation
                .as_ref()
                .or(self.price.as_ref())
                .and_then(Price::from_upstream),
        }
    }
}
