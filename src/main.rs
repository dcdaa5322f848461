//! Uptime Core server
//!
//! Run with: cargo run
//!
//! Configuration is read from `UPTIME_*` environment variables, see
//! [`uptime_core::config`]. RUST_LOG controls the log level (default: info).

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uptime_core::api::{run_server, AppState};
use uptime_core::clock::SystemClock;
use uptime_core::monitor::{MonitoringScheduler, SchedulerConfig};
use uptime_core::store::{load_seed_file, MemoryStore, MonitorStore};
use uptime_core::ServiceConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "uptime_core=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServiceConfig::from_env()?;

    tracing::info!("Uptime Core configuration:");
    tracing::info!("  Status API: {}:{}", config.host, config.port);
    tracing::info!("  Check interval: {:?}", config.check_interval);
    tracing::info!("  Max concurrency: {}", config.max_concurrency);
    tracing::info!("  Notification timeout: {:?}", config.notify_timeout);
    tracing::info!("  Uptime window: {} hours", config.uptime_window_hours);
    tracing::info!("  Alert dedup: {}", config.dedup);

    let memory = Arc::new(MemoryStore::new());
    match &config.seed_file {
        Some(path) => {
            load_seed_file(path, &memory)?;
        }
        None => tracing::warn!("UPTIME_SEED_FILE not set, starting with no targets"),
    }
    let store: Arc<dyn MonitorStore> = memory;

    let scheduler = Arc::new(MonitoringScheduler::new(
        Arc::clone(&store),
        Arc::new(SystemClock),
        SchedulerConfig::from(&config),
    ));
    let scheduler_handle = Arc::clone(&scheduler).start();

    let state = Arc::new(AppState {
        scheduler: Arc::clone(&scheduler),
        store,
    });
    run_server(&config, state).await?;

    scheduler.stop();
    if let Err(e) = scheduler_handle.await {
        tracing::error!("Scheduler task failed: {}", e);
    }

    tracing::info!("Uptime Core stopped");
    Ok(())
}
