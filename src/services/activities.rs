//! Tours and activities around a named place

use serde::Serialize;
use tracing::info;

use crate::config::DefaultsConfig;
use crate::error::ServiceError;
use crate::location_resolver::KeywordResolver;
use crate::models::activity::UpstreamActivity;
use crate::models::{Activity, Geo, decode_items};
use crate::upstream::{RetryPolicy, UpstreamClient};

pub const ACTIVITIES_PATH: &str = "/v1/shopping/activities";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivitySearchResult {
    /// Point the radius search was centered on
    pub center: Geo,
    pub activities: Vec<Activity>,
}

#[derive(Clone)]
pub struct ActivityService {
    client: UpstreamClient,
    retry: RetryPolicy,
    resolver: KeywordResolver,
    default_radius_km: f64,
    default_limit: usize,
}

impl ActivityService {
    pub fn new(
        client: UpstreamClient,
        retry: RetryPolicy,
        resolver: KeywordResolver,
        defaults: &DefaultsConfig,
    ) -> Self {
        Self {
            client,
            retry,
            resolver,
            default_radius_km: defaults.activity_radius_km,
            default_limit: defaults.activity_limit as usize,
        }
    }

    pub async fn search_activities(
        &self,
        keyword: &str,
        radius: Option<f64>,
        limit: Option<usize>,
        request_id: &str,
    ) -> Result<ActivitySearchResult, ServiceError> {
        let center = self.resolver.resolve_geo(keyword, request_id).await?;

        let query = [
            ("latitude", center.lat.to_string()),
            ("longitude", center.lng.to_string()),
            ("radius", radius.unwrap_or(self.default_radius_km).to_string()),
        ];
        let body = self
            .retry
            .run(request_id, || self.client.get(ACTIVITIES_PATH, &query, request_id))
            .await?;

        let activities: Vec<Activity> = decode_items::<UpstreamActivity>(&body, "activity", request_id)
            .into_iter()
            .filter_map(UpstreamActivity::into_activity)
            .take(limit.unwrap_or(self.default_limit))
            .collect();

        info!(request_id, keyword, count = activities.len(), "Activity search complete");
        Ok(ActivitySearchResult { center, activities })
    }
}
