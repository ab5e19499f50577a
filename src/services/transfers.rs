//! Transfer search, booking and cancellation
//!
//! Booking and cancellation are writes: one attempt, no retry, payload forwarded untouched.

use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

use crate::error::ServiceError;
use crate::location_resolver::is_location_code;
use crate::models::offers::{TransferQueryEcho, UpstreamTransferOffer};
use crate::models::{TransferOffer, decode_items, id_text};
use crate::upstream::{RetryPolicy, UpstreamClient};

pub const TRANSFER_OFFERS_PATH: &str = "/v1/shopping/transfer-offers";
pub const TRANSFER_ORDERS_PATH: &str = "/v1/ordering/transfer-orders";

const DEFAULT_PASSENGERS: u32 = 1;

/// Transfer search criteria as received from the caller
#[derive(Debug, Clone, PartialEq)]
pub struct TransferSearch {
    pub origin: String,
    pub destination: String,
    pub date_time: String,
    pub passengers: Option<u32>,
    pub currency: Option<String>,
}

impl TransferSearch {
    /// `YYYY-MM-DD` becomes midnight local time; anything longer is sent unchanged
    #[must_use]
    pub fn start_date_time(&self) -> String {
        let date_time = self.date_time.trim();
        if date_time.len() == 10 {
            format!("{date_time}T00:00:00")
        } else {
            date_time.to_string()
        }
    }

    /// Upstream search body.
    ///
    /// A code-shaped destination goes out as `endLocationCode`; anything else as a
    /// free-text address and city name.
    #[must_use]
    pub fn to_body(&self) -> Value {
        let mut body = Map::new();
        body.insert("startLocationCode".into(), json!(self.origin.trim()));

        let destination = self.destination.trim();
        if is_location_code(destination) {
            body.insert("endLocationCode".into(), json!(destination));
        } else {
            body.insert("endAddressLine".into(), json!(destination));
            body.insert("endCityName".into(), json!(destination));
        }

        body.insert("startDateTime".into(), json!(self.start_date_time()));
        body.insert(
            "passengers".into(),
            json!(self.passengers.unwrap_or(DEFAULT_PASSENGERS)),
        );
        if let Some(currency) = &self.currency {
            body.insert("currency".into(), json!(currency.to_ascii_uppercase()));
        }
        Value::Object(body)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferBooking {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
}

#[derive(Clone)]
pub struct TransferService {
    client: UpstreamClient,
    retry: RetryPolicy,
}

impl TransferService {
    pub fn new(client: UpstreamClient, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    pub async fn search_transfers(
        &self,
        search: &TransferSearch,
        request_id: &str,
    ) -> Result<Vec<TransferOffer>, ServiceError> {
        let body = search.to_body();
        debug!(request_id, origin = %search.origin, destination = %search.destination, "Searching transfers");

        let response = self
            .retry
            .run(request_id, || {
                self.client
                    .post(TRANSFER_OFFERS_PATH, &[], Some(&body), request_id)
            })
            .await?;

        let start_date_time = search.start_date_time();
        let echo = TransferQueryEcho {
            origin: search.origin.trim(),
            destination: search.destination.trim(),
            date_time: &start_date_time,
        };
        let offers: Vec<TransferOffer> =
            decode_items::<UpstreamTransferOffer>(&response, "transfer-offer", request_id)
                .into_iter()
                .enumerate()
                .map(|(index, offer)| offer.into_transfer_offer(index, &echo))
                .collect();

        info!(request_id, count = offers.len(), "Transfer search complete");
        Ok(offers)
    }

    /// Forward a booking payload to the order endpoint
    pub async fn book_transfer(
        &self,
        payload: &Value,
        offer_id: Option<&str>,
        request_id: &str,
    ) -> Result<TransferBooking, ServiceError> {
        let query: Vec<(&str, String)> = offer_id
            .map(|id| vec![("offerId", id.to_string())])
            .unwrap_or_default();

        let response = self
            .client
            .post(TRANSFER_ORDERS_PATH, &query, Some(payload), request_id)
            .await?;

        let order_id = id_text(response.get("data").and_then(|data| data.get("id")));
        match &order_id {
            Some(order_id) => info!(request_id, %order_id, "Transfer booked"),
            None => warn!(request_id, "Transfer booking response carried no order id"),
        }
        Ok(TransferBooking { order_id })
    }

    /// Forward a cancellation payload; the upstream result is returned as-is
    pub async fn cancel_transfer(
        &self,
        order_id: &str,
        payload: &Value,
        request_id: &str,
    ) -> Result<Value, ServiceError> {
        let path = cancellation_path(order_id);
        let result = self
            .client
            .post(&path, &[], Some(payload), request_id)
            .await?;

        info!(request_id, order_id, "Transfer cancellation forwarded");
        Ok(result)
    }
}

fn cancellation_path(order_id: &str) -> String {
    format!(
        "{TRANSFER_ORDERS_PATH}/{}/transfers/cancellation",
        urlencoding::encode(order_id)
    )
}
