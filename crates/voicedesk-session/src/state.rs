//! Session view state

use std::collections::BTreeMap;

use voicedesk_types::{
    AgentDetail, AgentSummary, AgentUpdate, ConversationStatus, VoiceSummary,
};

/// Working copy of the editable agent fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditableAgentForm {
    pub first_message: String,
    pub prompt_text: String,
    /// Empty when no voice is selected
    pub selected_voice_id: String,
    /// Values sent with the next call, keyed by placeholder name
    pub dynamic_variable_values: BTreeMap<String, String>,
}

impl EditableAgentForm {
    /// Derive the form from a freshly loaded agent.
    ///
    /// Variable values start empty: the placeholder defaults describe the
    /// template and are not sent unless the operator types them in.
    pub fn from_detail(detail: &AgentDetail) -> Self {
        Self {
            first_message: detail.first_message.clone(),
            prompt_text: detail.prompt_text.clone(),
            selected_voice_id: detail.voice_id.clone().unwrap_or_default(),
            dynamic_variable_values: detail
                .placeholder_keys()
                .map(|key| (key.to_string(), String::new()))
                .collect(),
        }
    }

    /// Set a variable value. Unknown keys are refused so the key set stays
    /// the one derived at load time.
    pub fn set_variable(&mut self, key: &str, value: impl Into<String>) -> bool {
        match self.dynamic_variable_values.get_mut(key) {
            Some(slot) => {
                *slot = value.into();
                true
            }
            None => false,
        }
    }

    pub fn to_update(&self) -> AgentUpdate {
        AgentUpdate {
            prompt_text: self.prompt_text.clone(),
            first_message: self.first_message.clone(),
            voice_id: Some(self.selected_voice_id.clone()).filter(|v| !v.is_empty()),
        }
    }
}

/// Where the next call goes and which agent number it comes from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallTarget {
    pub destination_number: String,
    pub origin_phone_number_id: String,
}

impl CallTarget {
    pub fn is_complete(&self) -> bool {
        !self.destination_number.trim().is_empty() && !self.origin_phone_number_id.trim().is_empty()
    }
}

/// Everything a presentation layer renders for one session
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub selected_agent_id: String,
    pub agents: Vec<AgentSummary>,
    pub voices: Vec<VoiceSummary>,
    pub agent_detail: Option<AgentDetail>,
    pub form: EditableAgentForm,
    pub call_target: CallTarget,
    pub conversation_id: Option<String>,
    pub conversation: Option<ConversationStatus>,
    pub polling: bool,

    pub agents_loading: bool,
    pub voices_loading: bool,
    pub detail_loading: bool,
    pub save_loading: bool,
    pub preview_playing: bool,

    /// Single visible error slot
    pub error: Option<String>,
}

impl SessionState {
    /// Replace the current agent and rebuild the form from it
    pub(crate) fn apply_detail(&mut self, detail: AgentDetail) {
        self.form = EditableAgentForm::from_detail(&detail);
        self.call_target.origin_phone_number_id = detail
            .first_phone_number_id()
            .unwrap_or_default()
            .to_string();
        self.agent_detail = Some(detail);
    }

    pub fn can_save(&self) -> bool {
        self.agent_detail.is_some() && !self.save_loading
    }

    pub fn can_start_call(&self) -> bool {
        self.agent_detail.is_some() && self.call_target.is_complete()
    }

    pub fn voice(&self, voice_id: &str) -> Option<&VoiceSummary> {
        self.voices.iter().find(|v| v.id == voice_id)
    }
}
