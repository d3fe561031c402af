//! Agent commands - edit and save an agent

use super::{open_agent, Session};
use crate::display;

/// Apply the given edits to an agent and save them
pub async fn save(
    session: &Session,
    agent_id: &str,
    first_message: Option<String>,
    prompt: Option<String>,
    voice: Option<String>,
) -> anyhow::Result<()> {
    if first_message.is_none() && prompt.is_none() && voice.is_none() {
        anyhow::bail!("Nothing to save: pass --first-message, --prompt or --voice");
    }

    open_agent(session, agent_id).await?;

    if let Some(first_message) = first_message {
        session.set_first_message(first_message).await;
    }
    if let Some(prompt) = prompt {
        session.set_prompt_text(prompt).await;
    }
    if let Some(voice) = voice {
        session.set_voice(voice).await;
    }

    display::section(&format!("Saving agent {}", agent_id));
    if session.save().await {
        let state = session.snapshot().await;
        display::success("Agent updated");
        display::kv("First message", &state.form.first_message);
        if !state.form.selected_voice_id.is_empty() {
            display::kv("Voice", &state.form.selected_voice_id);
        }
        Ok(())
    } else {
        let error = session.snapshot().await.error.unwrap_or_default();
        anyhow::bail!("Save failed: {}", error)
    }
}
