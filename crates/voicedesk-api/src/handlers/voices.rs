//! Voice Handlers

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use utoipa::IntoParams;

use voicedesk_gateway::VoiceQuery;

use crate::error::ApiResult;
use crate::state::AppState;

/// Voice listing parameters
///
/// `voice_id` switches to single-voice lookup; the pagination parameters are
/// ignored in that mode.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct VoicesParams {
    /// Page size (default 100), forwarded as given
    pub page_size: Option<String>,
    /// Continuation token from a previous page
    pub next_page_token: Option<String>,
    /// Look up a single voice by id
    pub voice_id: Option<String>,
}

/// List voices, or look up one voice
#[utoipa::path(
    get,
    path = "/api/v1/voices",
    tag = "Voices",
    params(VoicesParams),
    responses(
        (status = 200, description = "Voice page; single lookups return a one-element `voices` list"),
        (status = 500, description = "Missing credential or request failure")
    )
)]
pub async fn list_voices(
    State(state): State<Arc<AppState>>,
    Query(params): Query<VoicesParams>,
) -> ApiResult<Json<Value>> {
    let query = VoiceQuery::from_params(params.voice_id, params.page_size, params.next_page_token);
    Ok(Json(state.gateway.list_voices(query).await?))
}
