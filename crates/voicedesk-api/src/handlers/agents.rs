//! Agent Handlers
//!
//! List, read and partially update agents on the upstream platform.

use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use serde_json::Value;
use std::sync::Arc;

use crate::error::ApiResult;
use crate::state::AppState;

/// List agents
#[utoipa::path(
    get,
    path = "/api/v1/agents",
    tag = "Agents",
    responses(
        (status = 200, description = "Upstream agent list, unchanged"),
        (status = 500, description = "Missing credential or request failure")
    )
)]
pub async fn list_agents(State(state): State<Arc<AppState>>) -> ApiResult<Json<Value>> {
    Ok(Json(state.gateway.list_agents().await?))
}

/// Get one agent
#[utoipa::path(
    get,
    path = "/api/v1/agents/{agent_id}",
    tag = "Agents",
    params(("agent_id" = String, Path, description = "Agent id")),
    responses(
        (status = 200, description = "Upstream agent record, unchanged"),
        (status = 500, description = "Missing credential or request failure")
    )
)]
pub async fn get_agent(
    State(state): State<Arc<AppState>>,
    Path(agent_id): Path<String>,
) -> ApiResult<Json<Value>> {
    Ok(Json(state.gateway.get_agent(&agent_id).await?))
}

/// Partially update an agent
///
/// The body is forwarded as-is.
#[utoipa::path(
    patch,
    path = "/api/v1/agents/{agent_id}",
    tag = "Agents",
    params(("agent_id" = String, Path, description = "Agent id")),
    responses(
        (status = 200, description = "Updated agent record"),
        (status = 400, description = "Body is not JSON"),
        (status = 500, description = "Missing credential or request failure")
    )
)]
pub async fn update_agent(
    State(state): State<Arc<AppState>>,
    Path(agent_id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    state.gateway.ensure_configured()?;
    let body: Value = serde_json::from_slice(&body)?;

    tracing::info!(agent_id = %agent_id, "Updating agent");

    Ok(Json(state.gateway.update_agent(&agent_id, body).await?))
}
