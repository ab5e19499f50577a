//! Travel Gateway - one consistent API over a GDS-style travel-content provider
//!
//! Resolves free-text places to the codes and coordinates the upstream needs, calls
//! the matching sub-API, normalizes the answer, and classifies every failure into a
//! small, stable error taxonomy.

pub mod api;
pub mod classifier;
pub mod config;
pub mod error;
pub mod location_resolver;
pub mod logging;
pub mod models;
pub mod services;
pub mod upstream;
pub mod web;

// Re-export core types for public API
pub use api::AppState;
pub use config::GatewayConfig;
pub use error::{ApiError, ApiErrorCode, GatewayError, ServiceError};
pub use location_resolver::KeywordResolver;
pub use models::{Activity, CarOffer, Geo, Location, Poi, Price, TransferOffer};
pub use services::Services;
pub use upstream::{RetryPolicy, UpstreamClient, UpstreamFailure};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
