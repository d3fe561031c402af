//! Catalog commands - list agents and voices, show one agent

use colored::*;
use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};

use voicedesk_session::{ProxyClient, SessionConfig, SessionController, SessionEvent};

use super::{open_agent, Session};
use crate::display;
use crate::player::CommandPlayer;

/// Gateway status
pub async fn status(client: &ProxyClient) -> anyhow::Result<()> {
    display::section("Gateway Status");
    display::labeled("Server", client.base_url().as_str());

    match client.health().await {
        Ok(health) => {
            display::success("Gateway is reachable");
            if let Some(version) = health["version"].as_str() {
                display::kv("Version", version);
            }
            if health["upstream_configured"].as_bool() == Some(true) {
                display::success("Upstream credential configured");
            } else {
                display::warning("Upstream credential missing - proxy calls will fail");
            }
        }
        Err(e) => display::error(&format!("Gateway unreachable: {}", e)),
    }
    Ok(())
}

/// List agents
pub async fn agents(session: &Session) -> anyhow::Result<()> {
    session.load_agents().await;
    let state = session.snapshot().await;

    display::section("Agents");
    if let Some(error) = &state.error {
        anyhow::bail!("{}", error);
    }
    if state.agents.is_empty() {
        display::info("No agents configured");
    }
    for agent in &state.agents {
        println!("  {}  {}", agent.id.bright_yellow(), agent.name);
    }
    Ok(())
}

/// Show one agent with its editable fields
pub async fn show(session: &Session, agent_id: &str) -> anyhow::Result<()> {
    let state = open_agent(session, agent_id).await?;
    let Some(detail) = &state.agent_detail else {
        return Ok(());
    };

    display::section(&format!("Agent {}", detail.name));
    display::labeled("ID", &detail.id);

    let voice = match state.voice(&state.form.selected_voice_id) {
        Some(v) => format!("{} ({})", v.name, v.id),
        None if state.form.selected_voice_id.is_empty() => "none".to_string(),
        None => state.form.selected_voice_id.clone(),
    };
    display::labeled("Voice", &voice);

    println!();
    display::block("First message", &state.form.first_message);
    println!();
    display::block("Prompt", &state.form.prompt_text);

    println!();
    println!("  {}", "Phone numbers:".bright_white());
    if detail.phone_numbers.is_empty() {
        display::warning("No phone number attached - outbound calls need one");
    }
    for phone in &detail.phone_numbers {
        let number = format!("{} {}", phone.number, phone.label.as_deref().unwrap_or(""));
        display::kv(&phone.id, number.trim_end());
    }

    println!();
    println!("  {}", "Dynamic variables:".bright_white());
    if detail.dynamic_variable_placeholders.is_empty() {
        println!("      {}", "(none)".bright_black());
    }
    for (key, default) in &detail.dynamic_variable_placeholders {
        display::kv(key, &format!("default {}", placeholder_text(default)));
    }
    Ok(())
}

fn placeholder_text(value: &serde_json::Value) -> String {
    match value.as_str() {
        Some(text) => text.to_string(),
        None => value.to_string(),
    }
}

/// List the voice catalog, optionally previewing one voice
pub async fn voices(
    client: ProxyClient,
    preview: Option<String>,
    player: Option<String>,
) -> anyhow::Result<()> {
    let player = player.as_deref().and_then(CommandPlayer::parse);
    let session = match player {
        Some(player) => SessionController::with_player(
            Arc::new(client),
            SessionConfig::default(),
            Arc::new(player),
        ),
        None => super::session(client),
    };

    session.load_voices().await;
    let state = session.snapshot().await;

    display::section("Voices");
    if let Some(error) = &state.error {
        anyhow::bail!("{}", error);
    }
    for voice in &state.voices {
        let marker = if voice.preview_url.is_some() { "♪" } else { " " };
        println!("  {} {}  {}", marker.bright_green(), voice.id.bright_yellow(), voice.name);
    }

    let Some(voice_id) = preview else {
        return Ok(());
    };

    println!();
    let Some(url) = session.resolve_preview_url(&voice_id).await else {
        display::warning(&format!("No preview available for {}", voice_id));
        return Ok(());
    };
    display::labeled("Preview", &url);

    if !session.has_preview() {
        display::info("Pass --player <command> to play it");
        return Ok(());
    }

    session.set_voice(voice_id.as_str()).await;
    let mut events = session.subscribe();
    if session.preview_voice().await {
        display::info("Playing... (Ctrl+C to stop)");
        tokio::select! {
            _ = wait_preview_end(&mut events) => {}
            _ = tokio::signal::ctrl_c() => {
                session.stop_preview().await;
            }
        }
        display::success("Preview finished");
    }
    Ok(())
}

async fn wait_preview_end(events: &mut broadcast::Receiver<SessionEvent>) {
    loop {
        match events.recv().await {
            Ok(SessionEvent::PreviewStopped { .. }) | Err(RecvError::Closed) => return,
            Ok(_) | Err(RecvError::Lagged(_)) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_placeholder_text_unquotes_strings() {
        assert_eq!(placeholder_text(&json!("Sam")), "Sam");
        assert_eq!(placeholder_text(&json!(42)), "42");
        assert_eq!(placeholder_text(&json!(null)), "null");
    }
}
