//! VoiceDesk Types - Domain and wire types for the voice-agent console
//!
//! Shared by the proxy gateway, the HTTP surface and the session controller.
//! Field names on the wire follow the upstream conversational-voice platform;
//! the Rust side exposes flat domain shapes derived from them.
//!
//! - Agents (`AgentSummary`, `AgentDetail`, `AgentUpdate`)
//! - Voices (`VoiceSummary`, `VoicePage`)
//! - Calls (`CallRequest`, `CallStarted`)
//! - Conversations (`ConversationStatus`, `ConversationState`)
//! - The proxy error envelope (`ErrorEnvelope`)

pub mod agent;
pub mod voice;
pub mod call;
pub mod conversation;
pub mod envelope;

pub use agent::*;
pub use voice::*;
pub use call::*;
pub use conversation::*;
pub use envelope::*;
