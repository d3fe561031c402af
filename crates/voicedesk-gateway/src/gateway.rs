//! Upstream forwarders

use reqwest::{Method, Url};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

use voicedesk_types::DEFAULT_VOICE_PAGE_SIZE;

use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::transport::{UpstreamRequest, UpstreamResponse, UpstreamTransport};

/// Header carrying the upstream credential
pub const API_KEY_HEADER: &str = "xi-api-key";

/// Voice lookup mode
///
/// Callers pick the mode by supplying or omitting a voice id. The page size
/// is forwarded verbatim; upstream validates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceQuery {
    Page {
        page_size: Option<String>,
        next_page_token: Option<String>,
    },
    Single {
        voice_id: String,
    },
}

impl VoiceQuery {
    pub fn first_page() -> Self {
        Self::Page {
            page_size: None,
            next_page_token: None,
        }
    }

    /// Build from the optional query parameters of the proxy surface
    pub fn from_params(
        voice_id: Option<String>,
        page_size: Option<String>,
        next_page_token: Option<String>,
    ) -> Self {
        match voice_id.filter(|v| !v.is_empty()) {
            Some(voice_id) => Self::Single { voice_id },
            None => Self::Page {
                page_size: page_size.filter(|s| !s.is_empty()),
                next_page_token: next_page_token.filter(|t| !t.is_empty()),
            },
        }
    }
}

/// Stateless forwarder set for the upstream voice platform
#[derive(Clone)]
pub struct Gateway {
    config: Arc<GatewayConfig>,
    transport: Arc<dyn UpstreamTransport>,
}

impl Gateway {
    pub fn new(config: GatewayConfig, transport: Arc<dyn UpstreamTransport>) -> Self {
        Self {
            config: Arc::new(config),
            transport,
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn is_configured(&self) -> bool {
        self.config.has_credential()
    }

    /// Fail fast when no credential is configured
    pub fn ensure_configured(&self) -> GatewayResult<&str> {
        self.config
            .api_key
            .as_deref()
            .ok_or(GatewayError::Configuration)
    }

    // ========================================================================
    // Forwarders
    // ========================================================================

    pub async fn list_agents(&self) -> GatewayResult<Value> {
        let url = self.endpoint(&["v1", "convai", "agents"]);
        self.forward("list_agents", Method::GET, url, None).await
    }

    pub async fn get_agent(&self, agent_id: &str) -> GatewayResult<Value> {
        let url = self.endpoint(&["v1", "convai", "agents", agent_id]);
        self.forward("get_agent", Method::GET, url, None).await
    }

    pub async fn update_agent(&self, agent_id: &str, body: Value) -> GatewayResult<Value> {
        let url = self.endpoint(&["v1", "convai", "agents", agent_id]);
        self.forward("update_agent", Method::PATCH, url, Some(body)).await
    }

    pub async fn list_voices(&self, query: VoiceQuery) -> GatewayResult<Value> {
        match query {
            VoiceQuery::Single { voice_id } => {
                let url = self.endpoint(&["v2", "voices", &voice_id]);
                let voice = self.forward("get_voice", Method::GET, url, None).await?;
                Ok(json!({ "voices": [voice] }))
            }
            VoiceQuery::Page {
                page_size,
                next_page_token,
            } => {
                let mut url = self.endpoint(&["v2", "voices"]);
                {
                    let mut pairs = url.query_pairs_mut();
                    if let Some(token) = &next_page_token {
                        pairs.append_pair("next_page_token", token);
                    }
                    let size = page_size.unwrap_or_else(|| DEFAULT_VOICE_PAGE_SIZE.to_string());
                    pairs.append_pair("page_size", &size);
                }
                self.forward("list_voices", Method::GET, url, None).await
            }
        }
    }

    pub async fn get_conversation(&self, conversation_id: &str) -> GatewayResult<Value> {
        let url = self.endpoint(&["v1", "convai", "conversations", conversation_id]);
        self.forward("get_conversation", Method::GET, url, None).await
    }

    pub async fn start_call(&self, body: Value) -> GatewayResult<Value> {
        let url = self.endpoint(&["v1", "convai", "twilio", "outbound-call"]);
        self.forward("start_call", Method::POST, url, Some(body)).await
    }

    // ========================================================================
    // Plumbing
    // ========================================================================

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.config.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn forward(
        &self,
        operation: &'static str,
        method: Method,
        url: Url,
        body: Option<Value>,
    ) -> GatewayResult<Value> {
        let api_key = self.ensure_configured().map_err(|e| {
            warn!(operation, "Upstream credential is not configured");
            record_failure(operation, &e);
            e
        })?;

        let mut headers = vec![(API_KEY_HEADER, api_key.to_string())];
        if body.is_some() {
            headers.push(("content-type", "application/json".to_string()));
        }

        metrics::counter!("voicedesk_upstream_requests_total", "operation" => operation)
            .increment(1);
        debug!(operation, method = %method, url = %url, "Forwarding to upstream");

        let request = UpstreamRequest {
            method,
            url,
            headers,
            body,
        };

        let result = match self.transport.send(request).await {
            Ok(response) => interpret(response),
            Err(text) => Err(GatewayError::Transport(text)),
        };

        if let Err(e) = &result {
            warn!(operation, error = %e, "Upstream call failed");
            record_failure(operation, e);
        }
        result
    }
}

fn record_failure(operation: &'static str, error: &GatewayError) {
    metrics::counter!(
        "voicedesk_upstream_failures_total",
        "operation" => operation,
        "kind" => error.kind()
    )
    .increment(1);
}

fn interpret(response: UpstreamResponse) -> GatewayResult<Value> {
    if !response.is_success() {
        let details = if response.body.trim().is_empty() {
            json!({})
        } else if response.is_json() {
            serde_json::from_str(&response.body).unwrap_or(Value::String(response.body))
        } else {
            Value::String(response.body)
        };
        return Err(GatewayError::Upstream {
            status: response.status,
            details,
        });
    }

    if response.body.trim().is_empty() {
        return Ok(json!({}));
    }
    if response.is_json() {
        return serde_json::from_str(&response.body)
            .map_err(|e| GatewayError::Transport(e.to_string()));
    }
    Ok(serde_json::from_str(&response.body).unwrap_or_else(|_| json!({ "raw": response.body })))
}
