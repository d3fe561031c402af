//! Gateway configuration

use reqwest::Url;
use std::time::Duration;

use crate::error::GatewayError;

/// Environment variable holding the upstream API credential
pub const API_KEY_ENV: &str = "VOICEDESK_API_KEY";

/// Environment variable overriding the upstream base URL
pub const API_BASE_ENV: &str = "VOICEDESK_API_BASE";

/// Upstream platform used when no base URL is configured
pub const DEFAULT_API_BASE: &str = "https://api.elevenlabs.io";

/// Configuration handed to the gateway at construction
///
/// The credential stays optional here: a gateway without one still serves
/// requests, and each of them fails with [`GatewayError::Configuration`].
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub api_key: Option<String>,
    pub base_url: Url,
    pub request_timeout: Duration,
}

impl GatewayConfig {
    pub fn new(api_key: Option<String>, base_url: &str) -> Result<Self, GatewayError> {
        let trimmed = base_url.trim().trim_end_matches('/');
        let base_url = Url::parse(trimmed)
            .map_err(|e| GatewayError::InvalidBaseUrl(format!("{}: {}", trimmed, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(GatewayError::InvalidBaseUrl(trimmed.to_string()));
        }

        Ok(Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url,
            request_timeout: Duration::from_secs(30),
        })
    }

    /// Read the credential and base URL from the process environment
    pub fn from_env() -> Result<Self, GatewayError> {
        let api_key = std::env::var(API_KEY_ENV).ok();
        let base = std::env::var(API_BASE_ENV).unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
        Self::new(api_key, &base)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }
}
