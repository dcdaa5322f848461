use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use super::handlers::{
    check_target, health_check, last_cycle, run_cycle, target_summary, update_alert_status,
    AppState,
};
use crate::config::ServiceConfig;
use crate::monitor::MonitoringScheduler;

/// Build the application router
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Monitoring cycles
        .route("/cycles/last", get(last_cycle))
        .route("/cycles/run", post(run_cycle))
        // Targets
        .route("/targets/:id/summary", get(target_summary))
        .route("/targets/:id/check", post(check_target))
        // Alerts
        .route("/alerts/:id/status", post(update_alert_status))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the status API until ctrl-c, then stop the scheduler
pub async fn run_server(
    config: &ServiceConfig,
    state: Arc<AppState>,
) -> Result<(), Box<dyn std::error::Error>> {
    let scheduler = Arc::clone(&state.scheduler);
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!("Starting status API on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(scheduler))
        .await?;

    tracing::info!("Status API stopped");
    Ok(())
}

async fn shutdown_signal(scheduler: Arc<MonitoringScheduler>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }

    tracing::info!("Shutdown signal received, stopping scheduler...");
    scheduler.stop();
}
