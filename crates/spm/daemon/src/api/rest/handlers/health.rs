//! Health and diagnostics handlers

use crate::api::rest::state::AppState;
use crate::error::ApiResult;
use axum::{extract::State, Json};
use serde::Serialize;
use spm_bindings::BindingDiagnostics;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub version: String,
    pub uptime: String,
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime: state.uptime(),
    })
}

/// Active binding modes and configuration warnings
pub async fn binding_diagnostics(
    State(state): State<AppState>,
) -> ApiResult<Json<BindingDiagnostics>> {
    Ok(Json(state.registry.diagnostics()?))
}
