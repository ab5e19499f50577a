//! Per-resource services
//!
//! Each service owns the upstream paths for one resource, resolves keywords where the
//! resource needs codes or coordinates, and hands back normalized models. Raw upstream
//! JSON only leaves this layer for transfer cancellation, which is forwarded as-is.

pub mod activities;
pub mod cars;
pub mod content;
pub mod transfers;

use anyhow::Result;

use crate::config::GatewayConfig;
use crate::location_resolver::KeywordResolver;
use crate::upstream::{RetryPolicy, UpstreamClient};

pub use activities::{ActivityService, ActivitySearchResult};
pub use cars::{CarBookingOutcome, CarRentalService, CarSearchResult, ResolvedCodes};
pub use content::ContentService;
pub use transfers::{TransferBooking, TransferSearch, TransferService};

/// Every service wired to one shared upstream client
#[derive(Clone)]
pub struct Services {
    pub content: ContentService,
    pub cars: CarRentalService,
    pub transfers: TransferService,
    pub activities: ActivityService,
}

impl Services {
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        let client = UpstreamClient::new(&config.upstream)?;
        Ok(Self::with_client(client, config))
    }

    /// Build on an existing client, e.g. one pointed at a mock upstream
    pub fn with_client(client: UpstreamClient, config: &GatewayConfig) -> Self {
        let retry = RetryPolicy::from_config(&config.retry);
        let content = ContentService::new(client.clone(), retry, &config.defaults);
        let resolver = KeywordResolver::new(content.clone());

        Self {
            cars: CarRentalService::new(client.clone(), retry, resolver.clone()),
            transfers: TransferService::new(client.clone(), retry),
            activities: ActivityService::new(client, retry, resolver, &config.defaults),
            content,
        }
    }
}
