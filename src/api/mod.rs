//! HTTP routes
//!
//! Handlers validate input, call one service, and wrap the result in the success
//! envelope. Every failure leaves as an [`ApiError`].

pub mod activities;
pub mod cars;
pub mod content;
pub mod envelope;
pub mod request_id;
pub mod transfers;
pub mod validation;

use std::sync::Arc;

use axum::{
    Router,
    http::{Method, Uri},
    routing::{get, post},
};
use serde::Serialize;

use crate::VERSION;
use crate::classifier;
use crate::config::GatewayConfig;
use crate::error::{ApiError, ApiErrorCode, ServiceError};
use crate::services::Services;
use envelope::{ApiResult, Envelope};
use request_id::RequestId;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<Services>,
}

impl AppState {
    pub fn new(services: Services) -> Self {
        Self {
            services: Arc::new(services),
        }
    }

    pub fn from_config(config: &GatewayConfig) -> anyhow::Result<Self> {
        Ok(Self::new(Services::from_config(config)?))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/locations", get(content::search_locations))
        .route("/cities", get(content::search_cities))
        .route("/pois", get(content::pois_by_radius))
        .route("/recommendations", get(content::recommended_locations))
        .route("/cars/search", get(cars::search_cars))
        .route("/cars/book", post(cars::book_car))
        .route("/transfers/search", get(transfers::search_transfers))
        .route("/transfers/book", post(transfers::book_transfer))
        .route("/transfers/{order_id}/cancel", post(transfers::cancel_transfer))
        .route("/activities", get(activities::search_activities))
        .fallback(unknown_route)
        .method_not_allowed_fallback(unknown_route)
        .with_state(state)
}

/// Map a service failure through the classifier for this request
pub(crate) fn classified(request_id: &str) -> impl FnOnce(ServiceError) -> ApiError + '_ {
    move |err| classifier::classify(&err, request_id)
}

async fn unknown_route(RequestId(request_id): RequestId, method: Method, uri: Uri) -> ApiError {
    ApiError::new(
        ApiErrorCode::InvalidRequest,
        format!("No route for {method} {}", uri.path()),
        &request_id,
    )
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    version: &'static str,
}

async fn health(RequestId(request_id): RequestId) -> ApiResult<Health> {
    Ok(Envelope::new(
        &request_id,
        Health {
            status: "ok",
            version: VERSION,
        },
    ))
}
