//! Health Check Handlers

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::state::AppState;

/// Health check response
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Whether the upstream credential is configured
    pub upstream_configured: bool,
    /// Timestamp (ms since epoch)
    pub timestamp: i64,
}

/// Health check endpoint
///
/// Returns 200 while the process is up. A missing credential is reported,
/// not treated as unhealthy: proxy calls answer with a configuration error.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        upstream_configured: state.gateway.is_configured(),
        timestamp: chrono::Utc::now().timestamp_millis(),
    })
}
