//! CLI commands

pub mod agent;
pub mod call;
pub mod catalog;

use std::sync::Arc;

use voicedesk_session::{ProxyClient, SessionConfig, SessionController, SessionState};

pub type Session = SessionController<ProxyClient>;

pub fn session(client: ProxyClient) -> Session {
    SessionController::new(Arc::new(client), SessionConfig::default())
}

/// Load the catalog and the given agent, failing when the agent could not
/// be loaded
pub async fn open_agent(session: &Session, agent_id: &str) -> anyhow::Result<SessionState> {
    session.load_catalog().await;
    session.select_agent(agent_id).await;

    let state = session.snapshot().await;
    if state.agent_detail.is_none() {
        let reason = state
            .error
            .unwrap_or_else(|| "no detail returned".to_string());
        anyhow::bail!("Could not load agent {}: {}", agent_id, reason);
    }
    Ok(state)
}
