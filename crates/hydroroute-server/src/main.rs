//! HydroRoute server - route planning over the observation-station directory

use anyhow::Result;
use axum::routing::get;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hydroroute_server::api;
use hydroroute_server::config::Config;
use hydroroute_server::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("hydroroute_server=debug".parse()?))
        .init();

    tracing::info!("Starting HydroRoute server...");

    let config = Config::from_env();
    let port = config.server_port;
    tracing::info!(
        directory = %config.api_base_url,
        geocoding = config.geocode_key.is_some(),
        "upstream configuration"
    );
    let state = Arc::new(AppState::new(config));

    // Build the app
    let app = api::routes()
        .route("/health", get(|| async { "OK" }))
        .with_state(state)
        .layer(CorsLayer::permissive());

    // Run server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
