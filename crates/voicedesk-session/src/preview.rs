//! Voice preview playback

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tracing::warn;

use crate::events::SessionEvent;
use crate::state::SessionState;

#[derive(Debug, Clone, Error)]
pub enum PlaybackError {
    #[error("Playback failed: {0}")]
    Failed(String),

    #[error("Unsupported audio: {0}")]
    Unsupported(String),
}

/// Plays a preview clip.
///
/// `play` resolves when the clip ends. Dropping the future stops playback.
#[async_trait]
pub trait PreviewPlayer: Send + Sync + 'static {
    async fn play(&self, url: &str) -> Result<(), PlaybackError>;
}

pub(crate) struct PreviewHandle {
    voice_id: String,
    task: JoinHandle<()>,
}

impl PreviewHandle {
    pub fn voice_id(&self) -> &str {
        &self.voice_id
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Play `url` and clear `preview_playing` once playback ends, unless a newer
/// preview has started in the meantime.
pub(crate) fn spawn_preview(
    player: Arc<dyn PreviewPlayer>,
    state: Arc<RwLock<SessionState>>,
    events: broadcast::Sender<SessionEvent>,
    generation: Arc<AtomicU64>,
    current: u64,
    voice_id: String,
    url: String,
) -> PreviewHandle {
    let id = voice_id.clone();
    let task = tokio::spawn(async move {
        if let Err(e) = player.play(&url).await {
            warn!(voice_id = %id, error = %e, "Voice preview failed");
        }

        let mut state = state.write().await;
        if generation.load(Ordering::SeqCst) == current {
            state.preview_playing = false;
            let _ = events.send(SessionEvent::PreviewStopped {
                voice_id: id,
                timestamp: Utc::now(),
            });
        }
    });

    PreviewHandle { voice_id, task }
}
