//! Configuration management for the travel gateway
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::GatewayError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for the gateway
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Upstream travel-content API configuration
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// Retry policy for idempotent upstream reads
    #[serde(default)]
    pub retry: RetryConfig,
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Default search parameters
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

/// Upstream API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the upstream API
    #[serde(default = "default_upstream_base_url")]
    pub base_url: String,
    /// OAuth2 token endpoint, relative to `base_url` unless absolute
    #[serde(default = "default_token_url")]
    pub token_url: String,
    /// OAuth2 client id for the client-credentials grant
    pub client_id: Option<String>,
    /// OAuth2 client secret for the client-credentials grant
    pub client_secret: Option<String>,
    /// Pre-issued access token, used instead of the client-credentials grant
    pub access_token: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_upstream_timeout")]
    pub timeout_seconds: u32,
}

/// Retry configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts for a retryable read, including the first
    #[serde(default = "default_retry_max_attempts")]
    pub max_attempts: u32,
    /// Linear backoff step in milliseconds
    #[serde(default = "default_retry_backoff_ms")]
    pub backoff_ms: u64,
}

/// HTTP server configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    /// Maximum accepted request body in KB
    #[serde(default = "default_server_max_body_kb")]
    pub max_body_kb: usize,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Default search settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Page size for location searches
    #[serde(default = "default_location_page_limit")]
    pub location_page_limit: u32,
    /// Radius in kilometers for point-of-interest searches
    #[serde(default = "default_poi_radius")]
    pub poi_radius_km: f64,
    /// Radius in kilometers for activity searches
    #[serde(default = "default_activity_radius")]
    pub activity_radius_km: f64,
    /// Maximum number of activities returned
    #[serde(default = "default_activity_limit")]
    pub activity_limit: u32,
}

// Default value functions
fn default_upstream_base_url() -> String {
    "https://test.api.amadeus.com".to_string()
}

fn default_token_url() -> String {
    "/v1/security/oauth2/token".to_string()
}

fn default_upstream_timeout() -> u32 {
    10
}

fn default_retry_max_attempts() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    300
}

fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_server_max_body_kb() -> usize {
    256
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_location_page_limit() -> u32 {
    10
}

fn default_poi_radius() -> f64 {
    1.0
}

fn default_activity_radius() -> f64 {
    1.0
}

fn default_activity_limit() -> u32 {
    20
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_upstream_base_url(),
            token_url: default_token_url(),
            client_id: None,
            client_secret: None,
            access_token: None,
            timeout_seconds: default_upstream_timeout(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_retry_max_attempts(),
            backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            max_body_kb: default_server_max_body_kb(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            location_page_limit: default_location_page_limit(),
            poi_radius_km: default_poi_radius(),
            activity_radius_km: default_activity_radius(),
            activity_limit: default_activity_limit(),
        }
    }
}

impl ServerConfig {
    #[must_use]
    pub fn max_body_bytes(&self) -> usize {
        self.max_body_kb.saturating_mul(1024)
    }
}

impl UpstreamConfig {
    /// Absolute token endpoint URL
    #[must_use]
    pub fn token_endpoint(&self) -> String {
        if self.token_url.starts_with("http://") || self.token_url.starts_with("https://") {
            self.token_url.clone()
        } else {
            format!("{}{}", self.base_url.trim_end_matches('/'), self.token_url)
        }
    }
}

impl GatewayConfig {
    /// Load configuration from `config_path`, or the per-user default location, plus
    /// environment variables
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // TRAVEL_GATEWAY_UPSTREAM__CLIENT_ID=... style overrides
        builder = builder.add_source(
            Environment::with_prefix("TRAVEL_GATEWAY")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: GatewayConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("travel-gateway").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.upstream.base_url.is_empty() {
            self.upstream.base_url = default_upstream_base_url();
        }
        if self.upstream.token_url.is_empty() {
            self.upstream.token_url = default_token_url();
        }
        if self.upstream.timeout_seconds == 0 {
            self.upstream.timeout_seconds = default_upstream_timeout();
        }
        if self.retry.max_attempts == 0 {
            self.retry.max_attempts = default_retry_max_attempts();
        }
        if self.server.max_body_kb == 0 {
            self.server.max_body_kb = default_server_max_body_kb();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.defaults.location_page_limit == 0 {
            self.defaults.location_page_limit = default_location_page_limit();
        }
        if self.defaults.poi_radius_km <= 0.0 {
            self.defaults.poi_radius_km = default_poi_radius();
        }
        if self.defaults.activity_radius_km <= 0.0 {
            self.defaults.activity_radius_km = default_activity_radius();
        }
        if self.defaults.activity_limit == 0 {
            self.defaults.activity_limit = default_activity_limit();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_credentials()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate upstream credentials
    pub fn validate_credentials(&self) -> Result<()> {
        let upstream = &self.upstream;

        if let Some(token) = &upstream.access_token {
            if token.trim().is_empty() {
                return Err(GatewayError::config(
                    "Upstream access token cannot be empty if provided. Either remove it or provide a valid token."
                ).into());
            }
            return Ok(());
        }

        let has_id = upstream.client_id.as_deref().is_some_and(|s| !s.trim().is_empty());
        let has_secret = upstream
            .client_secret
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty());

        if !has_id || !has_secret {
            return Err(GatewayError::config(
                "Upstream credentials missing. Set upstream.client_id and upstream.client_secret, or upstream.access_token."
            ).into());
        }

        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.upstream.timeout_seconds > 60 {
            return Err(GatewayError::config("Upstream timeout cannot exceed 60 seconds").into());
        }

        if self.server.max_body_kb > 10_240 {
            return Err(GatewayError::config("Max body size cannot exceed 10240 KB").into());
        }

        if self.retry.max_attempts > 5 {
            return Err(GatewayError::config("Retry max attempts cannot exceed 5").into());
        }

        if self.retry.backoff_ms > 10_000 {
            return Err(GatewayError::config("Retry backoff cannot exceed 10000 ms").into());
        }

        if self.defaults.location_page_limit > 100 {
            return Err(GatewayError::config("Location page limit cannot exceed 100").into());
        }

        if self.defaults.poi_radius_km > 50.0 {
            return Err(GatewayError::config("POI radius cannot exceed 50 km").into());
        }

        if self.defaults.activity_radius_km > 20.0 {
            return Err(GatewayError::config("Activity radius cannot exceed 20 km").into());
        }

        if self.defaults.activity_limit > 50 {
            return Err(GatewayError::config("Activity limit cannot exceed 50").into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(GatewayError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(GatewayError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        if !self.upstream.base_url.starts_with("http://")
            && !self.upstream.base_url.starts_with("https://")
        {
            return Err(GatewayError::config(
                "Upstream base URL must be a valid HTTP or HTTPS URL",
            )
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_token() -> GatewayConfig {
        let mut config = GatewayConfig::default();
        config.upstream.access_token = Some("pre-issued-token".to_string());
        config
    }

    #[test]
    fn test_default_config() {
        let config = GatewayConfig::default();
        assert_eq!(config.upstream.base_url, "https://test.api.amadeus.com");
        assert_eq!(config.upstream.timeout_seconds, 10);
        assert_eq!(config.retry.max_attempts, 2);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.defaults.activity_limit, 20);
        assert!(config.upstream.client_id.is_none());
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let config = GatewayConfig::default();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("credentials missing"));
    }

    #[test]
    fn test_client_credentials_accepted() {
        let mut config = GatewayConfig::default();
        config.upstream.client_id = Some("client".to_string());
        config.upstream.client_secret = Some("secret".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_blank_access_token_rejected() {
        let mut config = GatewayConfig::default();
        config.upstream.access_token = Some("   ".to_string());
        assert!(config.validate_credentials().is_err());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = with_token();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = with_token();
        config.upstream.timeout_seconds = 500;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("timeout cannot exceed"));
    }

    #[test]
    fn test_max_body_size_is_bounded() {
        let mut config = with_token();
        config.server.max_body_kb = usize::MAX;
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("Max body size"));

        // Conversion stays total even for values validation would reject
        assert_eq!(config.server.max_body_bytes(), usize::MAX);
        config.server.max_body_kb = 256;
        assert_eq!(config.server.max_body_bytes(), 262_144);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_apply_defaults_fills_zeroes() {
        let mut config = with_token();
        config.upstream.timeout_seconds = 0;
        config.retry.max_attempts = 0;
        config.defaults.poi_radius_km = 0.0;
        config.apply_defaults();
        assert_eq!(config.upstream.timeout_seconds, 10);
        assert_eq!(config.retry.max_attempts, 2);
        assert_eq!(config.defaults.poi_radius_km, 1.0);
    }

    #[test]
    fn test_token_endpoint_resolution() {
        let mut config = GatewayConfig::default();
        config.upstream.base_url = "https://upstream.example/".to_string();
        assert_eq!(
            config.upstream.token_endpoint(),
            "https://upstream.example/v1/security/oauth2/token"
        );

        config.upstream.token_url = "https://auth.example/token".to_string();
        assert_eq!(config.upstream.token_endpoint(), "https://auth.example/token");
    }

    #[test]
    fn test_config_path_generation() {
        if let Some(path) = GatewayConfig::get_config_path() {
            assert!(path.to_string_lossy().contains("travel-gateway"));
            assert!(path.to_string_lossy().contains("config.toml"));
        }
    }
}
