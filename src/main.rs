//! forum-overlay server entry point.
//!
//! Starts the Axum HTTP server over the configured record store.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use forum_overlay::app_state::AppState;
use forum_overlay::codec::PushDropDecoder;
use forum_overlay::config::OverlayConfig;
use forum_overlay::service::OverlayService;
use forum_overlay::storage::{MemoryRecordStore, PostgresRecordStore, RecordStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = OverlayConfig::from_env()?;
    tracing::info!(
        addr = %config.listen_addr,
        topic_manager = %config.protocol.topic_manager,
        lookup_service = %config.protocol.lookup_service,
        "starting forum-overlay"
    );

    // Build storage layer
    let store: Arc<dyn RecordStore> = if config.persistence_enabled {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await
            .context("connecting to PostgreSQL")?;
        let store = PostgresRecordStore::new(pool);
        store.migrate().await.context("running migrations")?;
        tracing::info!("using PostgreSQL record store");
        Arc::new(store)
    } else {
        tracing::info!("using in-memory record store");
        Arc::new(MemoryRecordStore::new())
    };

    // Build service layer
    let overlay_service = OverlayService::new(
        Arc::new(config.protocol),
        Arc::new(PushDropDecoder::new()),
        store,
    );

    // Build router
    let app = forum_overlay::build_app(
        AppState::new(overlay_service),
        Duration::from_secs(config.request_timeout_secs),
    );

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
