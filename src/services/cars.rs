//! Car rental search and the booking capability gate

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::ServiceError;
use crate::location_resolver::KeywordResolver;
use crate::models::offers::{CarQueryEcho, UpstreamCarOffer};
use crate::models::{CarOffer, decode_items};
use crate::upstream::{RetryPolicy, UpstreamClient};

pub const CAR_OFFERS_PATH: &str = "/v1/shopping/car-offers";

const BOOKING_GUIDANCE: &str = "Car rental booking is not offered by the upstream for this account. \
     Use the offer's provider to complete the reservation.";

/// Codes actually sent upstream
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedCodes {
    pub pickup_code: String,
    pub dropoff_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CarSearchResult {
    pub resolved: ResolvedCodes,
    pub offers: Vec<CarOffer>,
}

/// Result of a booking attempt; booking is never available
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CarBookingOutcome {
    pub not_available: bool,
    pub guidance: String,
}

#[derive(Clone)]
pub struct CarRentalService {
    client: UpstreamClient,
    retry: RetryPolicy,
    resolver: KeywordResolver,
}

impl CarRentalService {
    pub fn new(client: UpstreamClient, retry: RetryPolicy, resolver: KeywordResolver) -> Self {
        Self {
            client,
            retry,
            resolver,
        }
    }

    /// Search rental offers between two places.
    ///
    /// `dropoff` defaults to the resolved pickup code.
    pub async fn search_cars(
        &self,
        pickup: &str,
        dropoff: Option<&str>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        driver_age: Option<u32>,
        request_id: &str,
    ) -> Result<CarSearchResult, ServiceError> {
        let pickup_code = self.resolve_code(pickup, request_id).await?;
        let dropoff_code = match dropoff {
            Some(dropoff) => self.resolve_code(dropoff, request_id).await?,
            None => pickup_code.clone(),
        };

        let mut query = vec![
            ("pickUpLocationCode", pickup_code.clone()),
            ("dropOffLocationCode", dropoff_code.clone()),
            ("pickUpDate", start_date.to_string()),
            ("dropOffDate", end_date.to_string()),
        ];
        if let Some(age) = driver_age {
            query.push(("driverAge", age.to_string()));
        }

        debug!(request_id, %pickup_code, %dropoff_code, %start_date, %end_date, "Searching car offers");
        let body = self
            .retry
            .run(request_id, || self.client.get(CAR_OFFERS_PATH, &query, request_id))
            .await?;

        let echo = CarQueryEcho {
            pickup_code: &pickup_code,
            dropoff_code: &dropoff_code,
            start_date,
            end_date,
        };
        let offers: Vec<CarOffer> = decode_items::<UpstreamCarOffer>(&body, "car-offer", request_id)
            .into_iter()
            .enumerate()
            .filter_map(|(index, offer)| offer.into_car_offer(index, &echo))
            .collect();

        info!(request_id, %pickup_code, %dropoff_code, count = offers.len(), "Car search complete");
        Ok(CarSearchResult {
            resolved: ResolvedCodes {
                pickup_code,
                dropoff_code,
            },
            offers,
        })
    }

    /// Car booking is not exposed upstream; report that without calling out
    #[must_use]
    pub fn book_car(&self, request_id: &str) -> CarBookingOutcome {
        info!(request_id, "Car booking requested; capability not available");
        CarBookingOutcome {
            not_available: true,
            guidance: BOOKING_GUIDANCE.to_string(),
        }
    }

    async fn resolve_code(&self, keyword: &str, request_id: &str) -> Result<String, ServiceError> {
        self.resolver
            .resolve_location_code(keyword, request_id)
            .await?
            .ok_or_else(|| ServiceError::unresolved(keyword.trim(), "location code"))
    }
}
