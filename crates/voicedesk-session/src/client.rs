//! HTTP client for the VoiceDesk proxy surface
//!
//! Talks to the `/api/v1` routes of a running gateway. The gateway owns the
//! upstream credential; this client never sees it.

use async_trait::async_trait;
use reqwest::{Client, Method, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

use voicedesk_types::{
    AgentDetail, AgentList, AgentSummary, AgentUpdate, CallRequest, CallStarted,
    ConversationStatus, ErrorEnvelope, VoicePage, VoiceSummary,
};

use crate::backend::{BackendError, BackendResult, ConsoleBackend};

/// Gateway address used when none is configured
pub const DEFAULT_SERVER_URL: &str = "http://localhost:3000";

#[derive(Clone)]
pub struct ProxyClient {
    base_url: Url,
    client: Client,
}

impl ProxyClient {
    pub fn new(base_url: &str) -> BackendResult<Self> {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_client(base_url: &str, client: Client) -> BackendResult<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');
        let base_url = Url::parse(trimmed)
            .map_err(|e| BackendError::InvalidUrl(format!("{}: {}", trimmed, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(BackendError::InvalidUrl(trimmed.to_string()));
        }
        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Health report of the gateway, outside the `/api/v1` prefix
    pub async fn health(&self) -> BackendResult<serde_json::Value> {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("health");
        }
        self.get(url).await
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(["api", "v1"]).extend(segments);
        }
        url
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> BackendResult<T> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        decode(response).await
    }

    async fn send<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: &B,
    ) -> BackendResult<T> {
        let response = self
            .client
            .request(method, url)
            .json(body)
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> BackendResult<T> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()));
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&text)
        .map(|envelope| envelope.summary())
        .unwrap_or_else(|_| {
            if text.is_empty() {
                format!("HTTP {}", status.as_u16())
            } else {
                text
            }
        });

    Err(BackendError::Upstream {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl ConsoleBackend for ProxyClient {
    async fn list_agents(&self) -> BackendResult<Vec<AgentSummary>> {
        let list: AgentList = self.get(self.url(&["agents"])).await?;
        Ok(list.agents)
    }

    async fn get_agent(&self, agent_id: &str) -> BackendResult<AgentDetail> {
        self.get(self.url(&["agents", agent_id])).await
    }

    async fn update_agent(&self, agent_id: &str, update: &AgentUpdate) -> BackendResult<()> {
        let _: serde_json::Value = self
            .send(Method::PATCH, self.url(&["agents", agent_id]), update)
            .await?;
        Ok(())
    }

    async fn list_voices(&self, page_size: u32) -> BackendResult<Vec<VoiceSummary>> {
        let mut url = self.url(&["voices"]);
        url.query_pairs_mut()
            .append_pair("page_size", &page_size.to_string());
        let page: VoicePage = self.get(url).await?;
        Ok(page.voices)
    }

    async fn get_voice(&self, voice_id: &str) -> BackendResult<VoiceSummary> {
        let mut url = self.url(&["voices"]);
        url.query_pairs_mut().append_pair("voice_id", voice_id);
        let page: VoicePage = self.get(url).await?;
        page.voices
            .into_iter()
            .find(|v| !v.id.is_empty())
            .ok_or_else(|| BackendError::Decode(format!("voice {} not in lookup result", voice_id)))
    }

    async fn start_call(&self, request: &CallRequest) -> BackendResult<CallStarted> {
        self.send(Method::POST, self.url(&["calls"]), request).await
    }

    async fn get_conversation(&self, conversation_id: &str) -> BackendResult<ConversationStatus> {
        self.get(self.url(&["conversations", conversation_id])).await
    }
}
