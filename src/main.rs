use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use travel_gateway::config::GatewayConfig;
use travel_gateway::{GatewayError, logging, web};

/// HTTP gateway in front of the travel-content API
#[derive(Debug, Parser)]
#[command(name = "travel-gateway", version, about)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen port, overriding the configured one
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let mut config = match GatewayConfig::load_from_path(args.config) {
        Ok(config) => config,
        Err(e) => {
            match e.downcast_ref::<GatewayError>() {
                Some(gateway_err) => eprintln!("{}", gateway_err.user_message()),
                None => eprintln!("Failed to load configuration: {e:#}"),
            }
            return ExitCode::FAILURE;
        }
    };
    if let Some(port) = args.port {
        config.server.port = port;
    }

    if let Err(e) = logging::init(&config.logging, args.verbose) {
        eprintln!("{e:#}");
        return ExitCode::FAILURE;
    }

    match web::run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = ?e, "Gateway terminated with an error");
            ExitCode::FAILURE
        }
    }
}
