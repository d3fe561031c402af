//! API Routes

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::handlers;
use crate::state::AppState;

/// Create API v1 routes
pub fn api_v1_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/agents", get(handlers::agents::list_agents))
        .route(
            "/agents/:agent_id",
            get(handlers::agents::get_agent).patch(handlers::agents::update_agent),
        )
        .route("/voices", get(handlers::voices::list_voices))
        .route(
            "/conversations/:conversation_id",
            get(handlers::conversations::get_conversation),
        )
        .route("/calls", post(handlers::calls::start_call))
}

/// Create Swagger UI routes
pub fn swagger_routes() -> Router<Arc<AppState>> {
    use crate::openapi::ApiDoc;
    use utoipa::OpenApi;
    use utoipa_swagger_ui::SwaggerUi;

    Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
