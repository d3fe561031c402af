//! Conversation poll loop
//!
//! One loop per started call. A loop only writes the session state while its
//! epoch is still the current one, so a replaced or cancelled loop can never
//! overwrite the conversation of a newer call.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, oneshot, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::backend::ConsoleBackend;
use crate::events::{PollStopReason, SessionEvent};
use crate::state::SessionState;

/// Everything a poll loop touches, without a handle back to the controller
pub(crate) struct PollContext<B> {
    pub backend: Arc<B>,
    pub state: Arc<RwLock<SessionState>>,
    pub events: broadcast::Sender<SessionEvent>,
    pub epoch: Arc<AtomicU64>,
    pub interval: Duration,
}

/// Owns a running poll loop. Dropping it stops the loop.
pub(crate) struct PollHandle {
    conversation_id: String,
    stop_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        self.task.abort();
    }
}

/// Start polling `conversation_id` under `epoch`.
///
/// The first fetch happens immediately, then once per interval until the
/// conversation is terminal, a fetch fails, or the handle is dropped.
pub(crate) fn spawn_poller<B: ConsoleBackend>(
    ctx: PollContext<B>,
    conversation_id: String,
    epoch: u64,
) -> PollHandle {
    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
    let id = conversation_id.clone();

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(ctx.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = &mut stop_rx => break,
                _ = ticker.tick() => {
                    let result = ctx.backend.get_conversation(&id).await;

                    let mut state = ctx.state.write().await;
                    if ctx.epoch.load(Ordering::SeqCst) != epoch {
                        debug!(conversation_id = %id, "Discarding stale poll result");
                        break;
                    }

                    match result {
                        Ok(status) => {
                            let terminal = status.is_terminal();
                            let _ = ctx.events.send(SessionEvent::ConversationUpdated {
                                conversation_id: id.clone(),
                                status: status.status.to_string(),
                                turns: status.transcript.len(),
                                timestamp: Utc::now(),
                            });
                            state.conversation = Some(status);

                            if terminal {
                                state.polling = false;
                                info!(conversation_id = %id, "Conversation finished");
                                let _ = ctx.events.send(SessionEvent::PollingStopped {
                                    conversation_id: id.clone(),
                                    reason: PollStopReason::Terminal,
                                    timestamp: Utc::now(),
                                });
                                break;
                            }
                        }
                        Err(e) => {
                            // Poll failures stop the loop without touching the error slot
                            state.polling = false;
                            debug!(conversation_id = %id, error = %e, "Conversation poll failed");
                            let _ = ctx.events.send(SessionEvent::PollingStopped {
                                conversation_id: id.clone(),
                                reason: PollStopReason::FetchFailed,
                                timestamp: Utc::now(),
                            });
                            break;
                        }
                    }
                }
            }
        }
    });

    PollHandle {
        conversation_id,
        stop_tx: Some(stop_tx),
        task,
    }
}
