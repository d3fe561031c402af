//! Conversation Handlers

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;
use std::sync::Arc;

use crate::error::ApiResult;
use crate::state::AppState;

/// Get conversation status, transcript and analysis
#[utoipa::path(
    get,
    path = "/api/v1/conversations/{conversation_id}",
    tag = "Conversations",
    params(("conversation_id" = String, Path, description = "Conversation id")),
    responses(
        (status = 200, description = "Upstream conversation record, unchanged"),
        (status = 500, description = "Missing credential or request failure")
    )
)]
pub async fn get_conversation(
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<String>,
) -> ApiResult<Json<Value>> {
    Ok(Json(state.gateway.get_conversation(&conversation_id).await?))
}
