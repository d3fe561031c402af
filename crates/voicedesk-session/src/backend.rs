//! Backend seam between the session and the proxy surface

use async_trait::async_trait;
use thiserror::Error;

use voicedesk_types::{
    AgentDetail, AgentSummary, AgentUpdate, CallRequest, CallStarted, ConversationStatus,
    VoiceSummary,
};

pub type BackendResult<T> = Result<T, BackendError>;

#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// The proxy answered with a non-success status
    #[error("{message}")]
    Upstream { status: u16, message: String },

    /// The proxy could not be reached
    #[error("Request failed: {0}")]
    Transport(String),

    /// The answer did not have the expected shape
    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),
}

/// Operations the session needs from the proxy surface
#[async_trait]
pub trait ConsoleBackend: Send + Sync + 'static {
    async fn list_agents(&self) -> BackendResult<Vec<AgentSummary>>;

    async fn get_agent(&self, agent_id: &str) -> BackendResult<AgentDetail>;

    async fn update_agent(&self, agent_id: &str, update: &AgentUpdate) -> BackendResult<()>;

    /// First page of the voice catalog
    async fn list_voices(&self, page_size: u32) -> BackendResult<Vec<VoiceSummary>>;

    async fn get_voice(&self, voice_id: &str) -> BackendResult<VoiceSummary>;

    async fn start_call(&self, request: &CallRequest) -> BackendResult<CallStarted>;

    async fn get_conversation(&self, conversation_id: &str) -> BackendResult<ConversationStatus>;
}
