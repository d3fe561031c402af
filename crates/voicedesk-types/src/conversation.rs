//! Conversation status types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a conversation
///
/// Known upstream values map to dedicated variants; anything else lands in
/// `Other` and is treated as still in progress.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConversationState {
    Initiated,
    InProgress,
    Processing,
    Done,
    Failed,
    Error,
    Other(String),
}

impl ConversationState {
    /// No further state change is expected once terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed | Self::Error)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Initiated => "initiated",
            Self::InProgress => "in-progress",
            Self::Processing => "processing",
            Self::Done => "done",
            Self::Failed => "failed",
            Self::Error => "error",
            Self::Other(s) => s,
        }
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for ConversationState {
    fn from(value: String) -> Self {
        match value.as_str() {
            "initiated" => Self::Initiated,
            "in-progress" => Self::InProgress,
            "processing" => Self::Processing,
            "done" => Self::Done,
            "failed" => Self::Failed,
            "error" => Self::Error,
            _ => Self::Other(value),
        }
    }
}

impl From<ConversationState> for String {
    fn from(state: ConversationState) -> Self {
        match state {
            ConversationState::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ConversationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One transcript turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptTurn {
    pub role: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Post-call analysis
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationAnalysis {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_summary_title: Option<String>,
}

/// Snapshot of a conversation as returned by a poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationStatus {
    #[serde(rename = "conversation_id")]
    pub id: String,
    #[serde(default)]
    pub status: ConversationState,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub transcript: Vec<TranscriptTurn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<ConversationAnalysis>,
}

impl ConversationStatus {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<TranscriptTurn>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<TranscriptTurn>>::deserialize(deserializer)?.unwrap_or_default())
}
