//! Gateway error types

use serde_json::Value;
use thiserror::Error;

use crate::config::API_KEY_ENV;

pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// The upstream credential is not configured
    #[error("Missing {}", API_KEY_ENV)]
    Configuration,

    /// The upstream answered with a non-success status
    #[error("Upstream error ({status})")]
    Upstream { status: u16, details: Value },

    /// The upstream could not be reached or its body could not be read
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Invalid upstream base URL: {0}")]
    InvalidBaseUrl(String),
}

impl GatewayError {
    /// Short label used for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Upstream { .. } => "upstream",
            Self::Transport(_) => "transport",
            Self::InvalidBaseUrl(_) => "invalid_base_url",
        }
    }
}
