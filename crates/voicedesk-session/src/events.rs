//! Session events
//!
//! Broadcast to every subscriber of a [`crate::SessionController`] so a
//! presentation layer can redraw without polling the state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why a conversation poll loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollStopReason {
    /// The conversation reached a terminal status
    Terminal,
    /// A poll request failed; the last good snapshot is kept
    FetchFailed,
    /// Stopped by the operator, a newer call, or session teardown
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    CatalogLoaded {
        agents: usize,
        voices: usize,
        timestamp: DateTime<Utc>,
    },

    AgentLoaded {
        agent_id: String,
        timestamp: DateTime<Utc>,
    },

    AgentSaved {
        agent_id: String,
        timestamp: DateTime<Utc>,
    },

    CallStarted {
        agent_id: String,
        conversation_id: String,
        timestamp: DateTime<Utc>,
    },

    ConversationUpdated {
        conversation_id: String,
        status: String,
        turns: usize,
        timestamp: DateTime<Utc>,
    },

    PollingStopped {
        conversation_id: String,
        reason: PollStopReason,
        timestamp: DateTime<Utc>,
    },

    PreviewStarted {
        voice_id: String,
        timestamp: DateTime<Utc>,
    },

    PreviewStopped {
        voice_id: String,
        timestamp: DateTime<Utc>,
    },

    /// A stage wrote the error slot
    Error {
        message: String,
        timestamp: DateTime<Utc>,
    },
}

impl SessionEvent {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}
