//! filebin - shared file bin with expiring uploads
//!
//! Stores uploads in a local directory, serves them by short id, and deletes
//! them once they are older than the configured maximum age.

use filebin_registry::{ExpirySweeper, LocalBackend, Registry};
use filebin_server::{start_server, AppState, Result, ServerConfig, ServerError, SharedState};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let env_filter = EnvFilter::from_default_env()
        .add_directive("filebin_server=info".parse()?)
        .add_directive("filebin_registry=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    };

    info!("Starting filebin {}...", env!("CARGO_PKG_VERSION"));

    // Load configuration from environment
    let config = ServerConfig::from_env()?;
    info!("Listen address: {}", config.listen_addr);
    info!("Storage dir: {:?}", config.storage_dir);
    info!("Max age: {} hours", config.max_age.as_secs() / 3600);
    info!(
        "Upload limit: {} MB",
        config.upload_max_size / (1024 * 1024)
    );

    let backend = LocalBackend::new(&config.storage_dir).await.map_err(|e| {
        ServerError::Config(format!(
            "Cannot use storage dir {:?}: {}",
            config.storage_dir, e
        ))
    })?;
    let registry = Arc::new(Registry::open(Arc::new(backend), config.registry_config()).await?);
    info!(
        "Serving {} files (backend: {})",
        registry.len(),
        registry.backend_name()
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let shutdown_tx = Arc::new(shutdown_tx);

    let sweeper = ExpirySweeper::new(registry.clone()).spawn(shutdown_rx.clone());

    let signal_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
            return;
        }
        info!("Shutdown requested");
        signal_tx.send_replace(true);
    });

    let listen_addr = config.listen_addr;
    let state: SharedState = Arc::new(AppState::new(registry, config, shutdown_rx));
    let served = start_server(state, listen_addr).await;

    // Stop the sweeper whether the server exited cleanly or not.
    shutdown_tx.send_replace(true);
    if let Err(e) = sweeper.await {
        error!("Expiry sweeper task failed: {}", e);
    }

    served?;
    info!("filebin stopped");
    Ok(())
}
