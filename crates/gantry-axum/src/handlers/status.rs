//! Status handlers - supervised service state and lifecycle operations.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::error::HttpError;
use crate::state::AppState;
use gantry_core::domain::AppSpec;
use gantry_core::ports::ServiceStatus;

/// Get the supervised service status.
///
/// The status code itself is probe-friendly: `200` only while the service
/// is running and healthy, `503` while starting, unhealthy, or stopped.
pub async fn get(State(state): State<AppState>) -> (StatusCode, Json<ServiceStatus>) {
    let status = state.runner.status().await;
    let code = if status.running && status.state.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(status))
}

/// Get the effective launch spec of the supervised application.
pub async fn app(State(state): State<AppState>) -> Json<AppSpec> {
    Json(state.spec.clone())
}

/// Stop the supervised application gracefully.
pub async fn stop(State(state): State<AppState>) -> Result<Json<String>, HttpError> {
    state.runner.stop().await?;
    Ok(Json("stopped".to_string()))
}
