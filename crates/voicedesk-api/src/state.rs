//! Application state shared across handlers

use voicedesk_gateway::Gateway;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Upstream forwarders
    pub gateway: Gateway,
}

impl AppState {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }
}
