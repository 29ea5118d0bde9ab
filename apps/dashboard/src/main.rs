mod api;
mod config;
mod errors;
mod health;
mod models;
mod panels;
mod render;
mod routes;
mod shell;
mod shutdown;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::api::{HttpScreeningApi, ScreeningApi};
use crate::config::Config;
use crate::routes::build_router;
use crate::shutdown::install_shutdown_handler;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume screening dashboard v{}", env!("CARGO_PKG_VERSION"));

    // Backend client
    let api: Arc<dyn ScreeningApi> = Arc::new(HttpScreeningApi::new(
        &config.backend_url,
        config.request_timeout,
    )?);
    info!("Screening backend at {}", config.backend_url);

    // Build app state
    let state = AppState::new(api.clone(), config.clone())?;

    let shutdown = install_shutdown_handler();
    let poller = state
        .health
        .spawn_poller(api, config.health_poll_interval, shutdown.clone());

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    poller.await?;
    info!("Dashboard stopped");

    Ok(())
}
