//! Agent types
//!
//! The upstream platform returns agents as a deeply nested
//! `conversation_config` document. `AgentDetail` flattens the handful of
//! fields the console reads; `AgentUpdate` serializes back into the same
//! nesting for a partial update.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Entry of the agent list, used to populate a selector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSummary {
    #[serde(rename = "agent_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Response of the agent list call
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentList {
    #[serde(default)]
    pub agents: Vec<AgentSummary>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// Phone number attached to an agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneNumber {
    #[serde(rename = "phone_number_id")]
    pub id: String,
    #[serde(rename = "phone_number", default)]
    pub number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Full agent record, flattened from the upstream document
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "AgentRecord")]
pub struct AgentDetail {
    pub id: String,
    pub name: String,
    pub first_message: String,
    pub prompt_text: String,
    /// Placeholder name -> default value as configured upstream
    pub dynamic_variable_placeholders: BTreeMap<String, Value>,
    pub voice_id: Option<String>,
    pub phone_numbers: Vec<PhoneNumber>,
}

impl AgentDetail {
    /// Id of the first phone number, the default origin for outbound calls
    pub fn first_phone_number_id(&self) -> Option<&str> {
        self.phone_numbers.first().map(|p| p.id.as_str())
    }

    pub fn placeholder_keys(&self) -> impl Iterator<Item = &str> {
        self.dynamic_variable_placeholders.keys().map(String::as_str)
    }
}

// ============================================================================
// Wire shape
// ============================================================================

#[derive(Debug, Default, Deserialize)]
struct AgentRecord {
    agent_id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    conversation_config: Option<ConversationConfig>,
    #[serde(default)]
    phone_numbers: Option<Vec<PhoneNumber>>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ConversationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    agent: Option<AgentSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tts: Option<TtsSection>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct AgentSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    first_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    prompt: Option<PromptSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dynamic_variables: Option<DynamicVariables>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PromptSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    prompt: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct DynamicVariables {
    #[serde(default)]
    dynamic_variable_placeholders: Option<BTreeMap<String, Value>>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TtsSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    voice_id: Option<String>,
}

impl From<AgentRecord> for AgentDetail {
    fn from(record: AgentRecord) -> Self {
        let config = record.conversation_config.unwrap_or_default();
        let agent = config.agent.unwrap_or_default();
        let voice_id = config
            .tts
            .and_then(|t| t.voice_id)
            .filter(|v| !v.is_empty());

        Self {
            id: record.agent_id,
            name: record.name.unwrap_or_default(),
            first_message: agent.first_message.unwrap_or_default(),
            prompt_text: agent.prompt.and_then(|p| p.prompt).unwrap_or_default(),
            dynamic_variable_placeholders: agent
                .dynamic_variables
                .and_then(|d| d.dynamic_variable_placeholders)
                .unwrap_or_default(),
            voice_id,
            phone_numbers: record.phone_numbers.unwrap_or_default(),
        }
    }
}

// ============================================================================
// Partial update
// ============================================================================

/// Partial update of an agent: prompt, greeting and optionally the voice
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "AgentUpdateWire")]
pub struct AgentUpdate {
    pub prompt_text: String,
    pub first_message: String,
    pub voice_id: Option<String>,
}

#[derive(Serialize)]
struct AgentUpdateWire {
    conversation_config: ConversationConfig,
}

impl From<AgentUpdate> for AgentUpdateWire {
    fn from(update: AgentUpdate) -> Self {
        Self {
            conversation_config: ConversationConfig {
                agent: Some(AgentSection {
                    first_message: Some(update.first_message),
                    prompt: Some(PromptSection {
                        prompt: Some(update.prompt_text),
                    }),
                    dynamic_variables: None,
                }),
                tts: update
                    .voice_id
                    .filter(|v| !v.is_empty())
                    .map(|voice_id| TtsSection {
                        voice_id: Some(voice_id),
                    }),
            },
        }
    }
}
