//! Call Handlers

use axum::{body::Bytes, extract::State, Json};
use serde_json::Value;
use std::sync::Arc;

use crate::error::ApiResult;
use crate::state::AppState;

/// Start an outbound call
///
/// The body is forwarded as-is; the answer carries the `conversation_id`
/// to poll.
#[utoipa::path(
    post,
    path = "/api/v1/calls",
    tag = "Calls",
    responses(
        (status = 200, description = "Call started"),
        (status = 400, description = "Body is not JSON"),
        (status = 500, description = "Missing credential or request failure")
    )
)]
pub async fn start_call(State(state): State<Arc<AppState>>, body: Bytes) -> ApiResult<Json<Value>> {
    state.gateway.ensure_configured()?;
    let body: Value = serde_json::from_slice(&body)?;

    let result = state.gateway.start_call(body).await?;
    let conversation_id = result
        .get("conversation_id")
        .and_then(serde_json::Value::as_str)
        .unwrap_or("");
    tracing::info!(conversation_id, "Outbound call started");

    Ok(Json(result))
}
