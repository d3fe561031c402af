//! Voice catalog types

use serde::{Deserialize, Serialize};

/// Name shown for a configured voice the platform could not describe
pub const UNKNOWN_VOICE_NAME: &str = "Unknown voice";

/// Default and maximum page size used when loading the voice catalog
pub const DEFAULT_VOICE_PAGE_SIZE: u32 = 100;

/// Voice catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceSummary {
    #[serde(rename = "voice_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
}

impl VoiceSummary {
    /// Placeholder entry for a voice id that could not be looked up
    pub fn unknown(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: UNKNOWN_VOICE_NAME.to_string(),
            preview_url: None,
        }
    }
}

/// One page of the voice catalog
///
/// The single-voice lookup is returned in the same shape with exactly one
/// entry, so callers decode both modes identically.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoicePage {
    #[serde(default)]
    pub voices: Vec<VoiceSummary>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// Insert `voice` at the front of `catalog` unless its id is already present.
///
/// Returns whether the catalog changed.
pub fn prepend_voice(catalog: &mut Vec<VoiceSummary>, voice: VoiceSummary) -> bool {
    if catalog.iter().any(|v| v.id == voice.id) {
        return false;
    }
    catalog.insert(0, voice);
    true
}
