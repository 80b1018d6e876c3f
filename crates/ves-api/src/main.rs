//! # ves-api — Binary Entry Point
//!
//! Starts the Axum HTTP server for the VeriStamp evidence API.
//! Binds to a configurable address (default 0.0.0.0:8080).

use ves_api::config::AppConfig;
use ves_api::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env().map_err(|e| {
        tracing::error!("Configuration error: {e}");
        e
    })?;

    let addr = config.bind_addr;
    let state = AppState::new(config);
    let app = ves_api::app(state);

    tracing::info!("VeriStamp evidence API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
