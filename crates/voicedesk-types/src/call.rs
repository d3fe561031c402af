//! Outbound call types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Request to start an outbound call
///
/// Built fresh from the session form at call time and never retained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRequest {
    pub agent_id: String,
    #[serde(
        rename = "agent_phone_number_id",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub origin_phone_number_id: Option<String>,
    #[serde(rename = "to_number")]
    pub destination_number: String,
    #[serde(rename = "conversation_initiation_client_data", default)]
    pub client_data: ClientData,
}

/// Per-call data handed to the agent at conversation start
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientData {
    #[serde(default)]
    pub dynamic_variables: BTreeMap<String, String>,
}

impl CallRequest {
    pub fn new(
        agent_id: impl Into<String>,
        origin_phone_number_id: Option<String>,
        destination_number: impl Into<String>,
        dynamic_variables: BTreeMap<String, String>,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            origin_phone_number_id: origin_phone_number_id.filter(|id| !id.is_empty()),
            destination_number: destination_number.into(),
            client_data: ClientData { dynamic_variables },
        }
    }

    pub fn dynamic_variables(&self) -> &BTreeMap<String, String> {
        &self.client_data.dynamic_variables
    }
}

/// Response of a successful call start
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallStarted {
    pub conversation_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(rename = "callSid", default, skip_serializing_if = "Option::is_none")]
    pub call_sid: Option<String>,
}
