//! Application setup and initialization.

pub mod routes;
pub mod server;

use crate::state::AppState;
use anyhow::{Context, Result};
use shardbox_core::Config;
use shardbox_storage::{FsMetadataStore, HttpBlobBackend};
use std::sync::Arc;
use std::time::Duration;

/// Initialize the entire application: metadata store, backend client,
/// services, routes, and the uptime heartbeat.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    let store = FsMetadataStore::new(&config.metadata_path)
        .await
        .context("Failed to open metadata store")?;

    let backend = HttpBlobBackend::new(
        &config.blob_backend_url,
        config.blob_backend_token.clone(),
        Duration::from_secs(config.blob_backend_timeout_secs),
    )
    .context("Failed to build blob backend client")?;

    tracing::info!(
        metadata_path = %config.metadata_path,
        backend_url = %config.blob_backend_url,
        "Configuration loaded"
    );

    let state = Arc::new(AppState::new(
        config.clone(),
        Arc::new(store),
        Arc::new(backend),
    ));

    spawn_heartbeat(state.clone());

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}

/// Periodic liveness log so long-running deployments show up in log streams
/// even when idle.
fn spawn_heartbeat(state: Arc<AppState>) {
    let interval_secs = state.config.heartbeat_interval_secs;
    if interval_secs == 0 {
        return;
    }
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        // The first tick fires immediately; skip it.
        interval.tick().await;
        loop {
            interval.tick().await;
            tracing::info!(
                uptime_secs = state.started_at.elapsed().as_secs(),
                "Heartbeat"
            );
        }
    });
}
