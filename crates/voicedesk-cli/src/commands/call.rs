//! Call command - start an outbound call and follow the conversation

use colored::*;
use tokio::sync::broadcast::error::RecvError;

use voicedesk_session::{PollStopReason, SessionEvent};
use voicedesk_types::ConversationStatus;

use super::{open_agent, Session};
use crate::display;

pub async fn run(
    session: &Session,
    agent_id: &str,
    to: String,
    from: Option<String>,
    vars: Vec<(String, String)>,
) -> anyhow::Result<()> {
    open_agent(session, agent_id).await?;

    session.set_destination_number(to).await;
    if let Some(from) = from {
        session.set_origin_phone_number(from).await;
    }
    for (key, value) in vars {
        if !session.set_dynamic_variable(&key, value).await {
            display::warning(&format!("Agent does not declare variable '{}', ignored", key));
        }
    }

    let state = session.snapshot().await;
    if state.call_target.origin_phone_number_id.trim().is_empty() {
        anyhow::bail!("Agent has no phone number; pass --from <phone_number_id>");
    }
    if !state.can_start_call() {
        anyhow::bail!("Destination number is required");
    }

    display::section(&format!("Calling {}", state.call_target.destination_number));
    let mut events = session.subscribe();
    let Some(conversation_id) = session.start_call().await else {
        let error = session.snapshot().await.error.unwrap_or_default();
        anyhow::bail!("Call failed: {}", error);
    };
    display::success(&format!("Call started, conversation {}", conversation_id.bright_yellow()));
    display::info("Following conversation... (Ctrl+C to stop)");

    let mut last_status = String::new();
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(SessionEvent::ConversationUpdated { status, turns, .. }) => {
                    if status != last_status {
                        display::kv("Status", &format!("{} ({} turns)", status, turns));
                        last_status = status;
                    }
                }
                Ok(SessionEvent::PollingStopped { reason, .. }) => {
                    if reason == PollStopReason::FetchFailed {
                        display::warning("Lost track of the conversation, showing last known state");
                    }
                    break;
                }
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => {
                session.stop_polling().await;
                display::warning("Stopped following the conversation");
                break;
            }
        }
    }

    if let Some(conversation) = session.snapshot().await.conversation {
        print_conversation(&conversation);
    }
    Ok(())
}

fn print_conversation(conversation: &ConversationStatus) {
    display::section(&format!("Conversation {}", conversation.id));
    display::labeled("Status", conversation.status.as_str());

    println!();
    if conversation.transcript.is_empty() {
        println!("  {}", "(no transcript yet)".bright_black());
    }
    for turn in &conversation.transcript {
        let role = match turn.role.as_str() {
            "agent" => turn.role.bright_magenta(),
            _ => turn.role.bright_cyan(),
        };
        println!("  {:>6}: {}", role, turn.message.as_deref().unwrap_or(""));
    }

    if let Some(analysis) = &conversation.analysis {
        println!();
        if let Some(title) = &analysis.call_summary_title {
            display::labeled("Summary", title);
        }
        if let Some(summary) = &analysis.transcript_summary {
            display::block("Analysis", summary);
        }
    }
}
