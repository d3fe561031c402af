//! OpenAPI Documentation

use utoipa::OpenApi;

use crate::handlers;

/// VoiceDesk API Documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "VoiceDesk API",
        description = "Credential-injecting proxy in front of the conversational-voice platform.",
        version = "1.0.0"
    ),
    paths(
        handlers::health::health_check,
        handlers::agents::list_agents,
        handlers::agents::get_agent,
        handlers::agents::update_agent,
        handlers::voices::list_voices,
        handlers::conversations::get_conversation,
        handlers::calls::start_call,
    ),
    components(schemas(handlers::health::HealthResponse)),
    tags(
        (name = "Health", description = "Liveness"),
        (name = "Agents", description = "Agent configuration"),
        (name = "Voices", description = "Voice catalog"),
        (name = "Conversations", description = "Conversation status"),
        (name = "Calls", description = "Outbound calls")
    )
)]
pub struct ApiDoc;
