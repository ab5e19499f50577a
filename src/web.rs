use anyhow::{Context, Result};
use axum::Router;
use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::http::Request;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::info_span;

use crate::api::{self, AppState};
use crate::api::request_id::REQUEST_ID_HEADER;
use crate::config::{GatewayConfig, ServerConfig};
use crate::error::GatewayError;

/// Router with the request-id, tracing, CORS and body-limit layers applied
///
/// The body limit only bites in extractors that read the body, so handlers that ignore
/// it still answer with their own envelope.
pub fn app(state: AppState, server: &ServerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
        let request_id = request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("-");
        info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            request_id,
        )
    });

    api::router(state)
        .layer(DefaultBodyLimit::max(server.max_body_bytes()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(trace)
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(cors),
        )
}

pub async fn run(config: GatewayConfig) -> Result<()> {
    let state = AppState::from_config(&config)?;
    let app = app(state, &config.server);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(GatewayError::from)
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Travel gateway listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| GatewayError::server(e.to_string()))?;

    tracing::info!("Travel gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
