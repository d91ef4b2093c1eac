use dotenvy::dotenv;
use service_core::observability::logging::{init_tracing, TracingOptions};
use std::sync::Arc;
use tracing::info;
use trips_web_app::config::get_configuration;
use trips_web_app::services::{metrics::init_metrics, spawn_janitor, MemorySessionStore, SessionStore};
use trips_web_app::startup::build_router;
use trips_web_app::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let configuration = get_configuration().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing(TracingOptions {
        service_name: "trips-web-app",
        log_level: &configuration.logging.level,
        json: configuration.logging.json,
        otlp_endpoint: configuration.logging.otlp_endpoint.as_deref(),
    })?;

    init_metrics()?;

    let sessions: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
    spawn_janitor(sessions.clone(), configuration.session.purge_interval());

    let address = format!(
        "{}:{}",
        configuration.server.host, configuration.server.port
    );

    let state = AppState::new(configuration, sessions)?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&address).await.map_err(|e| {
        tracing::error!("Failed to bind TCP listener to {}: {}", address, e);
        anyhow::anyhow!("Failed to bind to address {}: {}", address, e)
    })?;

    info!("Starting trips-web-app on {}", address);
    axum::serve(listener, app).await.map_err(|e| {
        tracing::error!("Server error: {}", e);
        anyhow::anyhow!("Server error: {}", e)
    })?;

    Ok(())
}
