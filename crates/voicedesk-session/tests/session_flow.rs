//! Session controller tests
//!
//! Runs every stage against an in-memory backend. Poll timing tests use a
//! paused clock so intervals elapse instantly.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

use voicedesk_session::{
    BackendError, BackendResult, ConsoleBackend, PlaybackError, PollStopReason, PreviewPlayer,
    SessionConfig, SessionController, SessionEvent,
};
use voicedesk_types::{
    AgentDetail, AgentSummary, AgentUpdate, CallRequest, CallStarted, ConversationState,
    ConversationStatus, VoiceSummary, UNKNOWN_VOICE_NAME,
};

// ============================================================================
// Test backend
// ============================================================================

#[derive(Default)]
struct MockBackend {
    log: Mutex<Vec<String>>,
    agents: Mutex<Vec<AgentSummary>>,
    agents_error: Mutex<Option<BackendError>>,
    voices: Mutex<Vec<VoiceSummary>>,
    voices_error: Mutex<Option<BackendError>>,
    details: Mutex<HashMap<String, AgentDetail>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    voice_lookup: Mutex<HashMap<String, VoiceSummary>>,
    updates: Mutex<Vec<(String, AgentUpdate)>>,
    update_error: Mutex<Option<BackendError>>,
    call_requests: Mutex<Vec<CallRequest>>,
    call_error: Mutex<Option<BackendError>>,
    conversation_ids: Mutex<VecDeque<String>>,
    scripts: Mutex<HashMap<String, VecDeque<BackendResult<ConversationStatus>>>>,
}

impl MockBackend {
    fn new() -> Arc<Self> {
        let backend = Self::default();
        *backend.agents.lock().unwrap() = vec![
            AgentSummary { id: "a".into(), name: "Front desk".into() },
            AgentSummary { id: "b".into(), name: "Billing".into() },
        ];
        *backend.voices.lock().unwrap() = vec![
            voice("v1", "Aria", Some("https://cdn.test/v1.mp3")),
            voice("v2", "Roger", Some("https://cdn.test/v2.mp3")),
        ];
        backend.add_agent(agent("a", Some("v1"), json!({"customer_name": "Sam", "plan": "gold"}), &["pn_1", "pn_2"]));
        backend.add_agent(agent("b", Some("v2"), json!({}), &["pn_9"]));
        Arc::new(backend)
    }

    fn add_agent(&self, detail: AgentDetail) {
        self.details.lock().unwrap().insert(detail.id.clone(), detail);
    }

    fn gate(&self, agent_id: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.gates.lock().unwrap().insert(agent_id.to_string(), notify.clone());
        notify
    }

    fn script(&self, conversation_id: &str, results: Vec<BackendResult<ConversationStatus>>) {
        self.scripts
            .lock()
            .unwrap()
            .insert(conversation_id.to_string(), results.into());
    }

    fn next_conversations(&self, ids: &[&str]) {
        self.conversation_ids
            .lock()
            .unwrap()
            .extend(ids.iter().map(|id| id.to_string()));
    }

    fn record(&self, entry: String) {
        self.log.lock().unwrap().push(entry);
    }

    fn count(&self, entry: &str) -> usize {
        self.log.lock().unwrap().iter().filter(|e| *e == entry).count()
    }

    fn count_prefix(&self, prefix: &str) -> usize {
        self.log.lock().unwrap().iter().filter(|e| e.starts_with(prefix)).count()
    }
}

#[async_trait]
impl ConsoleBackend for MockBackend {
    async fn list_agents(&self) -> BackendResult<Vec<AgentSummary>> {
        self.record("list_agents".into());
        match self.agents_error.lock().unwrap().clone() {
            Some(e) => Err(e),
            None => Ok(self.agents.lock().unwrap().clone()),
        }
    }

    async fn get_agent(&self, agent_id: &str) -> BackendResult<AgentDetail> {
        self.record(format!("get_agent:{}", agent_id));
        let gate = self.gates.lock().unwrap().get(agent_id).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.details
            .lock()
            .unwrap()
            .get(agent_id)
            .cloned()
            .ok_or_else(|| not_found("agent"))
    }

    async fn update_agent(&self, agent_id: &str, update: &AgentUpdate) -> BackendResult<()> {
        self.record(format!("update_agent:{}", agent_id));
        self.updates
            .lock()
            .unwrap()
            .push((agent_id.to_string(), update.clone()));
        match self.update_error.lock().unwrap().clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn list_voices(&self, page_size: u32) -> BackendResult<Vec<VoiceSummary>> {
        self.record(format!("list_voices:{}", page_size));
        match self.voices_error.lock().unwrap().clone() {
            Some(e) => Err(e),
            None => Ok(self.voices.lock().unwrap().clone()),
        }
    }

    async fn get_voice(&self, voice_id: &str) -> BackendResult<VoiceSummary> {
        self.record(format!("get_voice:{}", voice_id));
        self.voice_lookup
            .lock()
            .unwrap()
            .get(voice_id)
            .cloned()
            .ok_or_else(|| not_found("voice"))
    }

    async fn start_call(&self, request: &CallRequest) -> BackendResult<CallStarted> {
        self.record("start_call".into());
        self.call_requests.lock().unwrap().push(request.clone());
        if let Some(e) = self.call_error.lock().unwrap().clone() {
            return Err(e);
        }
        let conversation_id = self
            .conversation_ids
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| "conv".to_string());
        Ok(CallStarted {
            conversation_id,
            success: Some(true),
            message: None,
            call_sid: None,
        })
    }

    async fn get_conversation(&self, conversation_id: &str) -> BackendResult<ConversationStatus> {
        self.record(format!("get_conversation:{}", conversation_id));
        let scripted = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(conversation_id)
            .and_then(|queue| queue.pop_front());
        scripted.unwrap_or_else(|| Ok(status(conversation_id, "in-progress")))
    }
}

// ============================================================================
// Test player
// ============================================================================

#[derive(Default)]
struct MockPlayer {
    urls: Mutex<Vec<String>>,
    ended: AtomicUsize,
    finish: Notify,
    fail: bool,
}

struct EndGuard<'a>(&'a AtomicUsize);

impl Drop for EndGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl PreviewPlayer for MockPlayer {
    async fn play(&self, url: &str) -> Result<(), PlaybackError> {
        self.urls.lock().unwrap().push(url.to_string());
        let _guard = EndGuard(&self.ended);
        if self.fail {
            return Err(PlaybackError::Unsupported("audio/ogg".into()));
        }
        self.finish.notified().await;
        Ok(())
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn voice(id: &str, name: &str, preview_url: Option<&str>) -> VoiceSummary {
    VoiceSummary {
        id: id.to_string(),
        name: name.to_string(),
        preview_url: preview_url.map(str::to_string),
    }
}

fn agent(id: &str, voice_id: Option<&str>, placeholders: Value, phones: &[&str]) -> AgentDetail {
    let phone_numbers: Vec<Value> = phones
        .iter()
        .map(|p| json!({"phone_number_id": p, "phone_number": "+15550000"}))
        .collect();
    serde_json::from_value(json!({
        "agent_id": id,
        "name": format!("Agent {}", id),
        "conversation_config": {
            "agent": {
                "first_message": "Hello",
                "prompt": { "prompt": "You are helpful." },
                "dynamic_variables": { "dynamic_variable_placeholders": placeholders }
            },
            "tts": { "voice_id": voice_id }
        },
        "phone_numbers": phone_numbers
    }))
    .unwrap()
}

fn status(conversation_id: &str, state: &str) -> ConversationStatus {
    serde_json::from_value(json!({
        "conversation_id": conversation_id,
        "status": state,
        "transcript": [{ "role": "agent", "message": "Hello" }]
    }))
    .unwrap()
}

fn not_found(what: &str) -> BackendError {
    BackendError::Upstream {
        status: 404,
        message: format!("Upstream error: {} not found", what),
    }
}

async fn session(backend: &Arc<MockBackend>) -> SessionController<MockBackend> {
    let session = SessionController::new(backend.clone(), SessionConfig::default());
    session.load_catalog().await;
    session
}

/// Catalog loaded, agent "a" selected, destination filled in
async fn ready_for_call(backend: &Arc<MockBackend>) -> SessionController<MockBackend> {
    let session = session(backend).await;
    session.select_agent("a").await;
    session.set_destination_number("+15550100").await;
    session
}

async fn wait_until(mut check: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if check() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}

fn drain(rx: &mut tokio::sync::broadcast::Receiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

// ============================================================================
// Catalog
// ============================================================================

#[tokio::test]
async fn test_catalog_loads_agents_and_voices() {
    let backend = MockBackend::new();
    let session = SessionController::new(backend.clone(), SessionConfig::default());
    let mut rx = session.subscribe();

    session.load_catalog().await;

    let state = session.snapshot().await;
    assert_eq!(state.agents.len(), 2);
    assert_eq!(state.voices.len(), 2);
    assert!(!state.agents_loading);
    assert!(!state.voices_loading);
    assert!(state.error.is_none());
    assert_eq!(backend.count("list_voices:100"), 1);

    let events = drain(&mut rx);
    assert!(matches!(
        events.last(),
        Some(SessionEvent::CatalogLoaded { agents: 2, voices: 2, .. })
    ));
}

#[tokio::test]
async fn test_voice_failure_does_not_block_agents() {
    let backend = MockBackend::new();
    *backend.voices_error.lock().unwrap() = Some(BackendError::Transport("connection reset".into()));

    let session = session(&backend).await;

    let state = session.snapshot().await;
    assert_eq!(state.agents.len(), 2);
    assert!(state.voices.is_empty());
    assert_eq!(state.error.as_deref(), Some("Request failed: connection reset"));
}

#[tokio::test]
async fn test_agent_failure_leaves_list_empty() {
    let backend = MockBackend::new();
    *backend.agents_error.lock().unwrap() = Some(BackendError::Upstream {
        status: 500,
        message: "Missing VOICEDESK_API_KEY".into(),
    });

    let session = session(&backend).await;

    let state = session.snapshot().await;
    assert!(state.agents.is_empty());
    assert_eq!(state.voices.len(), 2);
    assert_eq!(state.error.as_deref(), Some("Missing VOICEDESK_API_KEY"));
}

// ============================================================================
// Agent detail
// ============================================================================

#[tokio::test]
async fn test_select_agent_fills_form() {
    let backend = MockBackend::new();
    let session = session(&backend).await;

    session.select_agent("a").await;

    let state = session.snapshot().await;
    assert_eq!(state.selected_agent_id, "a");
    assert!(!state.detail_loading);
    assert_eq!(state.form.first_message, "Hello");
    assert_eq!(state.form.prompt_text, "You are helpful.");
    assert_eq!(state.form.selected_voice_id, "v1");
    assert_eq!(state.call_target.origin_phone_number_id, "pn_1");
}

#[tokio::test]
async fn test_dynamic_variables_start_empty() {
    let backend = MockBackend::new();
    let session = session(&backend).await;

    session.select_agent("a").await;

    let values = session.snapshot().await.form.dynamic_variable_values;
    assert_eq!(values.len(), 2);
    assert_eq!(values["customer_name"], "");
    assert_eq!(values["plan"], "");
}

#[tokio::test]
async fn test_unknown_variable_is_refused() {
    let backend = MockBackend::new();
    let session = session(&backend).await;
    session.select_agent("a").await;

    assert!(session.set_dynamic_variable("customer_name", "Dana").await);
    assert!(!session.set_dynamic_variable("account_id", "42").await);

    let values = session.snapshot().await.form.dynamic_variable_values;
    assert_eq!(values.len(), 2);
    assert!(!values.contains_key("account_id"));
}

#[tokio::test]
async fn test_latest_selection_wins() {
    let backend = MockBackend::new();
    let session = session(&backend).await;
    let gate = backend.gate("a");

    let first = {
        let session = session.clone();
        tokio::spawn(async move { session.select_agent("a").await })
    };
    wait_until(|| backend.count("get_agent:a") == 1).await;

    session.select_agent("b").await;
    gate.notify_one();
    first.await.unwrap();

    let state = session.snapshot().await;
    assert_eq!(state.selected_agent_id, "b");
    assert_eq!(state.agent_detail.as_ref().map(|d| d.id.as_str()), Some("b"));
    assert_eq!(state.form.selected_voice_id, "v2");
    assert_eq!(state.call_target.origin_phone_number_id, "pn_9");
    assert!(!state.detail_loading);
}

#[tokio::test]
async fn test_empty_selection_sends_nothing() {
    let backend = MockBackend::new();
    let session = session(&backend).await;

    session.select_agent("").await;

    assert_eq!(backend.count_prefix("get_agent"), 0);
    assert_eq!(session.snapshot().await.selected_agent_id, "");
}

#[tokio::test]
async fn test_detail_failure_writes_error() {
    let backend = MockBackend::new();
    let session = session(&backend).await;

    session.select_agent("missing").await;

    let state = session.snapshot().await;
    assert!(state.agent_detail.is_none());
    assert!(!state.detail_loading);
    assert_eq!(state.error.as_deref(), Some("Upstream error: agent not found"));
}

#[tokio::test]
async fn test_missing_voice_is_backfilled_once() {
    let backend = MockBackend::new();
    backend.add_agent(agent("c", Some("v9"), json!({}), &["pn_1"]));
    backend
        .voice_lookup
        .lock()
        .unwrap()
        .insert("v9".into(), voice("v9", "Nova", None));
    let session = session(&backend).await;

    session.select_agent("c").await;
    session.select_agent("c").await;

    let voices = session.snapshot().await.voices;
    assert_eq!(voices[0].id, "v9");
    assert_eq!(voices[0].name, "Nova");
    assert_eq!(voices.iter().filter(|v| v.id == "v9").count(), 1);
    assert_eq!(voices.len(), 3);
    assert_eq!(backend.count("get_voice:v9"), 1);
}

#[tokio::test]
async fn test_failed_backfill_adds_placeholder() {
    let backend = MockBackend::new();
    backend.add_agent(agent("c", Some("v404"), json!({}), &["pn_1"]));
    let session = session(&backend).await;

    session.select_agent("c").await;

    let state = session.snapshot().await;
    assert_eq!(state.voices[0].id, "v404");
    assert_eq!(state.voices[0].name, UNKNOWN_VOICE_NAME);
    assert!(state.error.is_none());
}

#[tokio::test]
async fn test_known_voice_needs_no_lookup() {
    let backend = MockBackend::new();
    let session = session(&backend).await;

    session.select_agent("a").await;

    assert_eq!(backend.count_prefix("get_voice"), 0);
    assert_eq!(session.snapshot().await.voices.len(), 2);
}

// ============================================================================
// Save
// ============================================================================

#[tokio::test]
async fn test_save_without_agent_is_noop() {
    let backend = MockBackend::new();
    let session = session(&backend).await;

    assert!(!session.save().await);
    assert_eq!(backend.count_prefix("update_agent"), 0);
}

#[tokio::test]
async fn test_save_sends_form_and_keeps_edits() {
    let backend = MockBackend::new();
    let session = session(&backend).await;
    session.select_agent("a").await;

    session.set_first_message("Welcome back").await;
    session.set_prompt_text("Be concise.").await;
    session.set_voice("v2").await;
    assert!(session.save().await);

    let updates = backend.updates.lock().unwrap().clone();
    assert_eq!(updates.len(), 1);
    let (agent_id, update) = &updates[0];
    assert_eq!(agent_id, "a");
    assert_eq!(update.first_message, "Welcome back");
    assert_eq!(update.prompt_text, "Be concise.");
    assert_eq!(update.voice_id.as_deref(), Some("v2"));

    let state = session.snapshot().await;
    assert!(!state.save_loading);
    assert_eq!(state.form.first_message, "Welcome back");
    assert_eq!(backend.count("get_agent:a"), 1);
}

#[tokio::test]
async fn test_save_failure_writes_error() {
    let backend = MockBackend::new();
    *backend.update_error.lock().unwrap() = Some(BackendError::Upstream {
        status: 422,
        message: "Upstream error: invalid prompt".into(),
    });
    let session = session(&backend).await;
    session.select_agent("a").await;

    assert!(!session.save().await);

    let state = session.snapshot().await;
    assert!(!state.save_loading);
    assert_eq!(state.error.as_deref(), Some("Upstream error: invalid prompt"));
}

// ============================================================================
// Calls and polling
// ============================================================================

#[tokio::test]
async fn test_call_without_agent_is_noop() {
    let backend = MockBackend::new();
    let session = session(&backend).await;
    session.set_destination_number("+15550100").await;
    session.set_origin_phone_number("pn_1").await;

    assert_eq!(session.start_call().await, None);
    assert_eq!(backend.count("start_call"), 0);
}

#[tokio::test]
async fn test_call_with_missing_fields_sends_nothing() {
    let backend = MockBackend::new();
    let session = session(&backend).await;
    session.select_agent("a").await;

    // No destination yet
    assert_eq!(session.start_call().await, None);

    session.set_destination_number("   ").await;
    assert_eq!(session.start_call().await, None);

    session.set_destination_number("+15550100").await;
    session.set_origin_phone_number("").await;
    assert_eq!(session.start_call().await, None);

    assert_eq!(backend.count("start_call"), 0);
    assert!(session.snapshot().await.error.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_call_request_uses_form_values() {
    let backend = MockBackend::new();
    backend.next_conversations(&["c1"]);
    let session = ready_for_call(&backend).await;
    session.set_origin_phone_number("pn_2").await;
    session.set_dynamic_variable("customer_name", "Dana").await;

    assert_eq!(session.start_call().await.as_deref(), Some("c1"));

    let request = backend.call_requests.lock().unwrap()[0].clone();
    assert_eq!(request.agent_id, "a");
    assert_eq!(request.origin_phone_number_id.as_deref(), Some("pn_2"));
    assert_eq!(request.destination_number, "+15550100");
    assert_eq!(request.dynamic_variables()["customer_name"], "Dana");
    assert_eq!(request.dynamic_variables()["plan"], "");

    session.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_poll_stops_at_terminal_status() {
    let backend = MockBackend::new();
    backend.next_conversations(&["c1"]);
    backend.script("c1", vec![Ok(status("c1", "in-progress")), Ok(status("c1", "done"))]);
    let session = ready_for_call(&backend).await;
    let mut rx = session.subscribe();

    session.start_call().await;
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(backend.count("get_conversation:c1"), 2);
    let state = session.snapshot().await;
    assert!(!state.polling);
    assert_eq!(state.conversation_id.as_deref(), Some("c1"));
    assert_eq!(
        state.conversation.map(|c| c.status),
        Some(ConversationState::Done)
    );

    let events = drain(&mut rx);
    assert!(events.iter().any(|e| matches!(
        e,
        SessionEvent::PollingStopped { reason: PollStopReason::Terminal, .. }
    )));
}

#[tokio::test(start_paused = true)]
async fn test_new_call_cancels_previous_poll() {
    let backend = MockBackend::new();
    backend.next_conversations(&["c1", "c2"]);
    let session = ready_for_call(&backend).await;

    session.start_call().await;
    tokio::time::sleep(Duration::from_secs(1)).await;
    session.start_call().await;
    tokio::time::sleep(Duration::from_millis(8500)).await;

    assert_eq!(backend.count("get_conversation:c1"), 1);
    assert_eq!(backend.count("get_conversation:c2"), 3);
    let state = session.snapshot().await;
    assert_eq!(state.conversation_id.as_deref(), Some("c2"));
    assert_eq!(state.conversation.map(|c| c.id).as_deref(), Some("c2"));
    assert!(state.polling);

    session.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_poll_failure_stops_silently() {
    let backend = MockBackend::new();
    backend.next_conversations(&["c1"]);
    backend.script(
        "c1",
        vec![
            Ok(status("c1", "in-progress")),
            Err(BackendError::Transport("timed out".into())),
        ],
    );
    let session = ready_for_call(&backend).await;

    session.start_call().await;
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(backend.count("get_conversation:c1"), 2);
    let state = session.snapshot().await;
    assert!(!state.polling);
    assert!(state.error.is_none());
    assert_eq!(
        state.conversation.map(|c| c.status),
        Some(ConversationState::InProgress)
    );
}

#[tokio::test(start_paused = true)]
async fn test_stop_polling_cancels_loop() {
    let backend = MockBackend::new();
    backend.next_conversations(&["c1"]);
    let session = ready_for_call(&backend).await;

    session.start_call().await;
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(session.stop_polling().await);
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(backend.count("get_conversation:c1"), 1);
    assert!(!session.is_polling().await);
    assert!(!session.stop_polling().await);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_session_stops_polling() {
    let backend = MockBackend::new();
    backend.next_conversations(&["c1"]);
    let session = ready_for_call(&backend).await;

    session.start_call().await;
    tokio::time::sleep(Duration::from_secs(1)).await;
    drop(session);
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(backend.count("get_conversation:c1"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_call_failure_writes_error() {
    let backend = MockBackend::new();
    *backend.call_error.lock().unwrap() = Some(BackendError::Upstream {
        status: 400,
        message: "Upstream error: invalid number".into(),
    });
    let session = ready_for_call(&backend).await;

    assert_eq!(session.start_call().await, None);

    let state = session.snapshot().await;
    assert!(!state.polling);
    assert!(state.conversation_id.is_none());
    assert_eq!(state.error.as_deref(), Some("Upstream error: invalid number"));
}

// ============================================================================
// Voice preview
// ============================================================================

#[tokio::test]
async fn test_preview_unavailable_without_player() {
    let backend = MockBackend::new();
    let session = session(&backend).await;
    session.select_agent("a").await;

    assert!(!session.has_preview());
    assert!(!session.preview_voice().await);
    assert!(!session.snapshot().await.preview_playing);
}

#[tokio::test(start_paused = true)]
async fn test_preview_plays_catalog_url_until_end() {
    let backend = MockBackend::new();
    let player = Arc::new(MockPlayer::default());
    let session =
        SessionController::with_player(backend.clone(), SessionConfig::default(), player.clone());
    session.load_catalog().await;
    session.select_agent("a").await;

    assert!(session.preview_voice().await);
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(session.snapshot().await.preview_playing);
    assert_eq!(player.urls.lock().unwrap().as_slice(), ["https://cdn.test/v1.mp3"]);
    assert_eq!(backend.count_prefix("get_voice"), 0);

    player.finish.notify_one();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(!session.snapshot().await.preview_playing);
}

#[tokio::test(start_paused = true)]
async fn test_new_preview_stops_running_one() {
    let backend = MockBackend::new();
    let player = Arc::new(MockPlayer::default());
    let session =
        SessionController::with_player(backend.clone(), SessionConfig::default(), player.clone());
    session.load_catalog().await;
    session.select_agent("a").await;

    assert!(session.preview_voice().await);
    tokio::time::sleep(Duration::from_millis(10)).await;
    session.set_voice("v2").await;
    assert!(session.preview_voice().await);
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(player.urls.lock().unwrap().len(), 2);
    assert_eq!(player.ended.load(Ordering::SeqCst), 1);
    assert!(session.snapshot().await.preview_playing);

    assert!(session.stop_preview().await);
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(player.ended.load(Ordering::SeqCst), 2);
    assert!(!session.snapshot().await.preview_playing);
}

#[tokio::test(start_paused = true)]
async fn test_preview_looks_up_uncatalogued_voice() {
    let backend = MockBackend::new();
    backend.voice_lookup.lock().unwrap().insert(
        "v7".into(),
        voice("v7", "Lily", Some("https://cdn.test/v7.mp3")),
    );
    let player = Arc::new(MockPlayer::default());
    let session =
        SessionController::with_player(backend.clone(), SessionConfig::default(), player.clone());
    session.load_catalog().await;
    session.select_agent("a").await;
    session.set_voice("v7").await;

    assert!(session.preview_voice().await);
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(backend.count("get_voice:v7"), 1);
    assert_eq!(player.urls.lock().unwrap().as_slice(), ["https://cdn.test/v7.mp3"]);

    // Lookup failures are swallowed
    session.set_voice("v404").await;
    assert!(!session.preview_voice().await);
    assert!(session.snapshot().await.error.is_none());

    session.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_playback_error_clears_flag() {
    let backend = MockBackend::new();
    let player = Arc::new(MockPlayer {
        fail: true,
        ..MockPlayer::default()
    });
    let session =
        SessionController::with_player(backend.clone(), SessionConfig::default(), player.clone());
    session.load_catalog().await;
    session.select_agent("a").await;

    assert!(session.preview_voice().await);
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(!session.snapshot().await.preview_playing);
    assert_eq!(player.ended.load(Ordering::SeqCst), 1);
}
