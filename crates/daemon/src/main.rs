//! Queueline - Waitlist Engine Daemon
//! Composition root: SQLite store + change notifier + JSON-RPC server

mod config;
mod telemetry;

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use config::DaemonConfig;
use queueline_api_rpc::RpcServer;
use queueline_core::application::QueueWaitlistEngine;
use queueline_core::port::id_provider::UuidProvider;
use queueline_core::port::time_provider::SystemTimeProvider;
use queueline_core::port::{BroadcastChangeNotifier, TimeProvider};
use queueline_infra_sqlite::{create_pool, run_migrations, SqliteQueueRepository};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Configuration and logging
    let config = DaemonConfig::from_env()?;
    let _log_guard = telemetry::init_tracing(config.log_format, config.log_dir.as_deref())?;

    info!("Queueline v{} starting...", VERSION);

    // 2. Database
    info!(db_path = %config.db_path, "Initializing database...");
    if let Some(parent) = Path::new(&config.db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    let pool = create_pool(&config.db_path)
        .await
        .context("DB pool creation failed")?;
    run_migrations(&pool).await.context("Migration failed")?;

    // 3. Dependencies (DI wiring)
    let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);
    let repository = Arc::new(SqliteQueueRepository::new(
        pool.clone(),
        time_provider.clone(),
    ));
    let notifier = Arc::new(BroadcastChangeNotifier::new(config.notifier_capacity));

    let engine = QueueWaitlistEngine::new(
        repository.clone(),
        repository.clone(),
        notifier,
        time_provider,
        config.engine,
    );

    // 4. JSON-RPC server
    info!("Starting JSON-RPC server...");
    let server = RpcServer::new(
        config.rpc.clone(),
        engine,
        repository,
        Arc::new(UuidProvider),
    )
    .start()
    .await
    .context("RPC server start failed")?;

    info!(addr = %server.local_addr, "Waitlist engine ready");
    info!("Press Ctrl+C to shutdown");

    // 5. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received. Exiting gracefully...");

    server
        .handle
        .stop()
        .map_err(|e| anyhow::anyhow!("RPC server stop failed: {}", e))?;
    server.handle.stopped().await;
    pool.close().await;
    telemetry::shutdown();

    info!("Shutdown complete.");

    Ok(())
}
