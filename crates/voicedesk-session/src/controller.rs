//! Session controller
//!
//! Owns the session state and runs the catalog, detail, save, call and
//! preview stages against a [`ConsoleBackend`]. No lock is held while a
//! backend request is in flight.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{debug, info, warn};

use voicedesk_types::{prepend_voice, CallRequest, VoiceSummary, DEFAULT_VOICE_PAGE_SIZE};

use crate::backend::{BackendError, ConsoleBackend};
use crate::events::{PollStopReason, SessionEvent};
use crate::poller::{spawn_poller, PollContext, PollHandle};
use crate::preview::{spawn_preview, PreviewHandle, PreviewPlayer};
use crate::state::SessionState;

/// Interval between conversation polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub poll_interval: Duration,
    /// Page size of the initial voice catalog request
    pub voice_page_size: u32,
    /// Buffered events per subscriber before lagging
    pub event_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            voice_page_size: DEFAULT_VOICE_PAGE_SIZE,
            event_capacity: 256,
        }
    }
}

struct Inner<B> {
    backend: Arc<B>,
    config: SessionConfig,
    state: Arc<RwLock<SessionState>>,
    events: broadcast::Sender<SessionEvent>,

    /// Bumped on every selection; only the latest load writes the detail
    detail_generation: AtomicU64,

    /// Bumped whenever the active poll loop changes
    poll_epoch: Arc<AtomicU64>,
    poller: Mutex<Option<PollHandle>>,

    player: Option<Arc<dyn PreviewPlayer>>,
    preview_generation: Arc<AtomicU64>,
    preview: Mutex<Option<PreviewHandle>>,
}

/// Operator session over a [`ConsoleBackend`].
///
/// Clones share the same state. Background tasks stop once the last clone
/// is dropped.
pub struct SessionController<B: ConsoleBackend> {
    inner: Arc<Inner<B>>,
}

impl<B: ConsoleBackend> Clone for SessionController<B> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<B: ConsoleBackend> SessionController<B> {
    /// Session without voice preview
    pub fn new(backend: Arc<B>, config: SessionConfig) -> Self {
        Self::build(backend, config, None)
    }

    pub fn with_player(
        backend: Arc<B>,
        config: SessionConfig,
        player: Arc<dyn PreviewPlayer>,
    ) -> Self {
        Self::build(backend, config, Some(player))
    }

    fn build(
        backend: Arc<B>,
        config: SessionConfig,
        player: Option<Arc<dyn PreviewPlayer>>,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            inner: Arc::new(Inner {
                backend,
                config,
                state: Arc::new(RwLock::new(SessionState::default())),
                events,
                detail_generation: AtomicU64::new(0),
                poll_epoch: Arc::new(AtomicU64::new(0)),
                poller: Mutex::new(None),
                player,
                preview_generation: Arc::new(AtomicU64::new(0)),
                preview: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Copy of the current state
    pub async fn snapshot(&self) -> SessionState {
        self.inner.state.read().await.clone()
    }

    pub async fn is_polling(&self) -> bool {
        self.inner.state.read().await.polling
    }

    pub fn has_preview(&self) -> bool {
        self.inner.player.is_some()
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.inner.events.send(event);
    }

    fn record_error(&self, state: &mut SessionState, context: &str, error: &BackendError) {
        let message = error.to_string();
        warn!(error = %message, "{}", context);
        state.error = Some(message.clone());
        self.emit(SessionEvent::error(message));
    }

    // ========================================================================
    // Catalog
    // ========================================================================

    /// Load the agent list and the voice list concurrently
    pub async fn load_catalog(&self) {
        tokio::join!(self.load_agents(), self.load_voices());

        let state = self.inner.state.read().await;
        info!(
            agents = state.agents.len(),
            voices = state.voices.len(),
            "Catalog loaded"
        );
        self.emit(SessionEvent::CatalogLoaded {
            agents: state.agents.len(),
            voices: state.voices.len(),
            timestamp: Utc::now(),
        });
    }

    pub async fn load_agents(&self) {
        self.inner.state.write().await.agents_loading = true;

        let result = self.inner.backend.list_agents().await;

        let mut state = self.inner.state.write().await;
        state.agents_loading = false;
        match result {
            Ok(agents) => state.agents = agents,
            Err(e) => {
                state.agents.clear();
                self.record_error(&mut state, "Failed to load agents", &e);
            }
        }
    }

    pub async fn load_voices(&self) {
        self.inner.state.write().await.voices_loading = true;

        let result = self
            .inner
            .backend
            .list_voices(self.inner.config.voice_page_size)
            .await;

        let mut state = self.inner.state.write().await;
        state.voices_loading = false;
        match result {
            Ok(voices) => state.voices = voices,
            Err(e) => {
                state.voices.clear();
                self.record_error(&mut state, "Failed to load voices", &e);
            }
        }
    }

    // ========================================================================
    // Agent detail
    // ========================================================================

    fn is_current_selection(&self, generation: u64) -> bool {
        self.inner.detail_generation.load(Ordering::SeqCst) == generation
    }

    /// Select an agent and load its detail.
    ///
    /// An empty id only clears the selection. When selections overlap, only
    /// the most recent one writes the detail.
    pub async fn select_agent(&self, agent_id: &str) {
        let generation = self.inner.detail_generation.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut state = self.inner.state.write().await;
            state.selected_agent_id = agent_id.to_string();
            if agent_id.is_empty() {
                state.detail_loading = false;
                return;
            }
            state.error = None;
            state.detail_loading = true;
        }

        let result = self.inner.backend.get_agent(agent_id).await;

        let missing_voice = {
            let mut state = self.inner.state.write().await;
            if !self.is_current_selection(generation) {
                debug!(agent_id, "Discarding superseded agent load");
                return;
            }
            match result {
                Ok(detail) => {
                    state.apply_detail(detail);
                    let voice_id = state.form.selected_voice_id.clone();
                    if !voice_id.is_empty() && state.voice(&voice_id).is_none() {
                        Some(voice_id)
                    } else {
                        state.detail_loading = false;
                        None
                    }
                }
                Err(e) => {
                    state.detail_loading = false;
                    self.record_error(&mut state, "Failed to load agent", &e);
                    return;
                }
            }
        };

        if let Some(voice_id) = missing_voice {
            self.backfill_voice(&voice_id, generation).await;
        }

        self.emit(SessionEvent::AgentLoaded {
            agent_id: agent_id.to_string(),
            timestamp: Utc::now(),
        });
    }

    /// Make sure the agent's configured voice is listed in the catalog
    async fn backfill_voice(&self, voice_id: &str, generation: u64) {
        let entry = match self.inner.backend.get_voice(voice_id).await {
            Ok(voice) => voice,
            Err(e) => {
                debug!(voice_id, error = %e, "Voice lookup failed, using placeholder");
                VoiceSummary::unknown(voice_id)
            }
        };

        let mut state = self.inner.state.write().await;
        if prepend_voice(&mut state.voices, entry) {
            debug!(voice_id, "Added configured voice to catalog");
        }
        if self.is_current_selection(generation) {
            state.detail_loading = false;
        }
    }

    // ========================================================================
    // Form
    // ========================================================================

    pub async fn set_first_message(&self, value: impl Into<String>) {
        self.inner.state.write().await.form.first_message = value.into();
    }

    pub async fn set_prompt_text(&self, value: impl Into<String>) {
        self.inner.state.write().await.form.prompt_text = value.into();
    }

    pub async fn set_voice(&self, voice_id: impl Into<String>) {
        self.inner.state.write().await.form.selected_voice_id = voice_id.into();
    }

    /// Returns false for keys the loaded agent does not declare
    pub async fn set_dynamic_variable(&self, key: &str, value: impl Into<String>) -> bool {
        self.inner.state.write().await.form.set_variable(key, value)
    }

    pub async fn set_destination_number(&self, value: impl Into<String>) {
        self.inner.state.write().await.call_target.destination_number = value.into();
    }

    pub async fn set_origin_phone_number(&self, phone_number_id: impl Into<String>) {
        self.inner.state.write().await.call_target.origin_phone_number_id = phone_number_id.into();
    }

    // ========================================================================
    // Save
    // ========================================================================

    /// Send the form as a partial agent update.
    ///
    /// Does nothing without a loaded agent. The local form stays as edited;
    /// the agent is not reloaded.
    pub async fn save(&self) -> bool {
        let (agent_id, update) = {
            let mut state = self.inner.state.write().await;
            let Some(detail) = state.agent_detail.as_ref() else {
                return false;
            };
            let agent_id = detail.id.clone();
            state.save_loading = true;
            state.error = None;
            (agent_id, state.form.to_update())
        };

        let result = self.inner.backend.update_agent(&agent_id, &update).await;

        let mut state = self.inner.state.write().await;
        state.save_loading = false;
        match result {
            Ok(()) => {
                info!(agent_id = %agent_id, "Agent saved");
                self.emit(SessionEvent::AgentSaved {
                    agent_id,
                    timestamp: Utc::now(),
                });
                true
            }
            Err(e) => {
                self.record_error(&mut state, "Failed to save agent", &e);
                false
            }
        }
    }

    // ========================================================================
    // Calls
    // ========================================================================

    /// Start an outbound call and follow its conversation.
    ///
    /// Returns the conversation id, or `None` when no agent is loaded, the
    /// call target is incomplete, or the call could not be started.
    pub async fn start_call(&self) -> Option<String> {
        let (agent_id, request) = {
            let mut state = self.inner.state.write().await;
            let agent_id = state.agent_detail.as_ref()?.id.clone();
            if !state.call_target.is_complete() {
                return None;
            }
            state.error = None;
            let request = CallRequest::new(
                agent_id.clone(),
                Some(state.call_target.origin_phone_number_id.trim().to_string()),
                state.call_target.destination_number.trim(),
                state.form.dynamic_variable_values.clone(),
            );
            (agent_id, request)
        };

        match self.inner.backend.start_call(&request).await {
            Ok(started) if !started.conversation_id.is_empty() => {
                info!(
                    agent_id = %agent_id,
                    conversation_id = %started.conversation_id,
                    "Call started"
                );
                self.begin_polling(agent_id, started.conversation_id.clone())
                    .await;
                Some(started.conversation_id)
            }
            Ok(_) => {
                let mut state = self.inner.state.write().await;
                self.record_error(
                    &mut state,
                    "Call started without a conversation",
                    &BackendError::Decode("missing conversation_id".to_string()),
                );
                None
            }
            Err(e) => {
                let mut state = self.inner.state.write().await;
                self.record_error(&mut state, "Failed to start call", &e);
                None
            }
        }
    }

    async fn begin_polling(&self, agent_id: String, conversation_id: String) {
        let mut poller = self.inner.poller.lock().await;
        let previous = poller.take();

        let epoch = {
            let mut state = self.inner.state.write().await;
            let epoch = self.inner.poll_epoch.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(previous) = previous.as_ref() {
                if state.polling {
                    self.emit(SessionEvent::PollingStopped {
                        conversation_id: previous.conversation_id().to_string(),
                        reason: PollStopReason::Cancelled,
                        timestamp: Utc::now(),
                    });
                }
            }
            state.conversation_id = Some(conversation_id.clone());
            state.conversation = None;
            state.polling = true;
            epoch
        };
        drop(previous);

        self.emit(SessionEvent::CallStarted {
            agent_id,
            conversation_id: conversation_id.clone(),
            timestamp: Utc::now(),
        });

        let ctx = PollContext {
            backend: self.inner.backend.clone(),
            state: self.inner.state.clone(),
            events: self.inner.events.clone(),
            epoch: self.inner.poll_epoch.clone(),
            interval: self.inner.config.poll_interval,
        };
        *poller = Some(spawn_poller(ctx, conversation_id, epoch));
    }

    /// Stop following the current conversation. Returns false when no loop
    /// was running.
    pub async fn stop_polling(&self) -> bool {
        let Some(handle) = self.inner.poller.lock().await.take() else {
            return false;
        };

        let mut state = self.inner.state.write().await;
        self.inner.poll_epoch.fetch_add(1, Ordering::SeqCst);
        let was_polling = state.polling && !handle.is_finished();
        state.polling = false;
        let conversation_id = handle.conversation_id().to_string();
        drop(handle);

        if was_polling {
            info!(conversation_id = %conversation_id, "Polling stopped");
            self.emit(SessionEvent::PollingStopped {
                conversation_id,
                reason: PollStopReason::Cancelled,
                timestamp: Utc::now(),
            });
        }
        was_polling
    }

    // ========================================================================
    // Voice preview
    // ========================================================================

    /// Preview URL for a voice, from the catalog or a single-voice lookup
    pub async fn resolve_preview_url(&self, voice_id: &str) -> Option<String> {
        let cached = {
            let state = self.inner.state.read().await;
            state.voice(voice_id).and_then(|v| v.preview_url.clone())
        };
        if cached.is_some() {
            return cached;
        }

        match self.inner.backend.get_voice(voice_id).await {
            Ok(voice) => voice.preview_url,
            Err(e) => {
                debug!(voice_id, error = %e, "Preview lookup failed");
                None
            }
        }
    }

    /// Play the selected voice's preview, replacing any running one.
    ///
    /// Returns false when no player is configured, no voice is selected, or
    /// the voice has no preview.
    pub async fn preview_voice(&self) -> bool {
        let Some(player) = self.inner.player.clone() else {
            return false;
        };
        let voice_id = self.inner.state.read().await.form.selected_voice_id.clone();
        if voice_id.is_empty() {
            return false;
        }
        let Some(url) = self.resolve_preview_url(&voice_id).await else {
            return false;
        };

        let mut slot = self.inner.preview.lock().await;
        let previous = slot.take();
        let generation = {
            let mut state = self.inner.state.write().await;
            let generation = self.inner.preview_generation.fetch_add(1, Ordering::SeqCst) + 1;
            state.preview_playing = true;
            generation
        };
        if let Some(previous) = previous {
            let stopped = previous.voice_id().to_string();
            drop(previous);
            self.emit(SessionEvent::PreviewStopped {
                voice_id: stopped,
                timestamp: Utc::now(),
            });
        }

        self.emit(SessionEvent::PreviewStarted {
            voice_id: voice_id.clone(),
            timestamp: Utc::now(),
        });
        *slot = Some(spawn_preview(
            player,
            self.inner.state.clone(),
            self.inner.events.clone(),
            self.inner.preview_generation.clone(),
            generation,
            voice_id,
            url,
        ));
        true
    }

    /// Stop the running preview. Returns false when nothing was playing.
    pub async fn stop_preview(&self) -> bool {
        let Some(handle) = self.inner.preview.lock().await.take() else {
            return false;
        };

        let mut state = self.inner.state.write().await;
        self.inner.preview_generation.fetch_add(1, Ordering::SeqCst);
        let was_playing = state.preview_playing;
        state.preview_playing = false;
        let voice_id = handle.voice_id().to_string();
        drop(handle);

        if was_playing {
            self.emit(SessionEvent::PreviewStopped {
                voice_id,
                timestamp: Utc::now(),
            });
        }
        was_playing
    }

    /// Stop every background task of the session
    pub async fn shutdown(&self) {
        self.stop_polling().await;
        self.stop_preview().await;
    }
}
