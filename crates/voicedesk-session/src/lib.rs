//! VoiceDesk Session - Operator session state
//!
//! [`SessionController`] owns the in-memory view state of one operator
//! session and drives four independent stages against a [`ConsoleBackend`]:
//!
//! ```text
//! load_catalog()  ── agents ∥ voices
//! select_agent()  ── detail → editable form → voice backfill
//! save()          ── partial update of prompt, greeting, voice
//! start_call()    ── call start → conversation poll loop until terminal
//! ```
//!
//! Every stage writes failures into a single error slot and never returns
//! them to the caller. State changes are also broadcast as [`SessionEvent`]s
//! for presentation layers.

pub mod backend;
pub mod client;
pub mod controller;
pub mod events;
pub mod poller;
pub mod preview;
pub mod state;

pub use backend::{BackendError, BackendResult, ConsoleBackend};
pub use client::ProxyClient;
pub use controller::{SessionConfig, SessionController};
pub use events::{PollStopReason, SessionEvent};
pub use preview::{PlaybackError, PreviewPlayer};
pub use state::{CallTarget, EditableAgentForm, SessionState};
