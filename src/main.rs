//! slotswap-gateway server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use slotswap_gateway::api;
use slotswap_gateway::app_state::AppState;
use slotswap_gateway::auth::JwtAuthProvider;
use slotswap_gateway::config::{LogFormat, ServiceConfig};
use slotswap_gateway::domain::EventBus;
use slotswap_gateway::persistence::{MemoryStore, PostgresStore, SlotStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::from_env().context("loading configuration")?;
    init_tracing(config.log_format);
    tracing::info!(addr = %config.listen_addr, "starting slotswap-gateway");

    let store: Arc<dyn SlotStore> = if config.persistence_enabled {
        let store = PostgresStore::connect(&config)
            .await
            .context("connecting to PostgreSQL")?;
        tracing::info!("using PostgreSQL slot store");
        Arc::new(store)
    } else {
        tracing::warn!("persistence disabled, data is kept in memory only");
        Arc::new(MemoryStore::new())
    };

    let event_bus = EventBus::new(config.event_bus_capacity);
    let auth = Arc::new(JwtAuthProvider::new(&config.jwt_secret));
    let app = api::build_app(AppState::new(store, event_bus, auth));

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    tracing::info!("server stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
