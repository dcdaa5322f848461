use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::alerts::LifecycleError;
use crate::model::{Alert, AlertId, AlertStatus, CheckResult, TargetId};
use crate::monitor::{CycleError, CycleReport, MonitoringScheduler, UptimeSummary};
use crate::store::{MonitorStore, StoreError};

/// Application state shared across handlers
pub struct AppState {
    pub scheduler: Arc<MonitoringScheduler>,
    pub store: Arc<dyn MonitorStore>,
}

// ============================================================================
// Health Check
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub scheduler_running: bool,
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        scheduler_running: state.scheduler.is_running(),
    })
}

// ============================================================================
// Cycles
// ============================================================================

pub async fn last_cycle(State(state): State<Arc<AppState>>) -> Result<Json<CycleReport>, ApiError> {
    state
        .scheduler
        .last_report()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("No monitoring cycle has completed yet".to_string()))
}

pub async fn run_cycle(State(state): State<Arc<AppState>>) -> Result<Json<CycleReport>, ApiError> {
    let report = state.scheduler.run_cycle().await?;
    Ok(Json(report))
}

// ============================================================================
// Targets
// ============================================================================

pub async fn target_summary(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TargetId>,
) -> Result<Json<UptimeSummary>, ApiError> {
    state
        .scheduler
        .target_summary(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Target {} not found", id)))
}

/// Probe a target now without recording the result
pub async fn check_target(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TargetId>,
) -> Result<Json<CheckResult>, ApiError> {
    let target = state
        .store
        .get_target(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Target {} not found", id)))?;

    Ok(Json(state.scheduler.checker().check(&target).await))
}

// ============================================================================
// Alerts
// ============================================================================

#[derive(Deserialize)]
pub struct UpdateAlertRequest {
    pub status: String,
}

pub async fn update_alert_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<AlertId>,
    Json(request): Json<UpdateAlertRequest>,
) -> Result<Json<Alert>, ApiError> {
    let status: AlertStatus = request.status.parse().map_err(ApiError::BadRequest)?;
    let alert = state.scheduler.lifecycle().update_status(id, status).await?;
    Ok(Json(alert))
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::AlertNotFound(_) => ApiError::NotFound(e.to_string()),
            StoreError::Unavailable(_) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<LifecycleError> for ApiError {
    fn from(e: LifecycleError) -> Self {
        match e {
            LifecycleError::AlertNotFound(_) => ApiError::NotFound(e.to_string()),
            LifecycleError::InvalidTransition { .. } => ApiError::Conflict(e.to_string()),
            LifecycleError::Store(e) => e.into(),
        }
    }
}

impl From<CycleError> for ApiError {
    fn from(e: CycleError) -> Self {
        match e {
            CycleError::AlreadyRunning => ApiError::Conflict(e.to_string()),
            CycleError::ListTargets(_) => ApiError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}
