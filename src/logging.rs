//! Tracing subscriber setup

use anyhow::{Result, anyhow};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::LoggingConfig;

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init(config: &LoggingConfig, verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { config.level.as_str() };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match config.format.as_str() {
        "json" => registry
            .with(fmt::layer().json().with_current_span(true).with_span_list(false))
            .try_init(),
        _ => registry.with(fmt::layer().with_target(true)).try_init(),
    };

    installed.map_err(|e| anyhow!("Failed to initialize logging: {e}"))
}

fn default_directives(level: &str) -> String {
    format!("travel_gateway={level},tower_http={level},warn")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_parse() {
        let directives = default_directives("debug");
        assert_eq!(directives, "travel_gateway=debug,tower_http=debug,warn");
        assert!(EnvFilter::try_new(directives).is_ok());
    }
}
