//! Proxy error envelope
//!
//! Every failed proxy call answers with this body. The HTTP status carries
//! the error class; `details` carries the upstream body or the transport
//! failure text when there is one.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const UPSTREAM_ERROR: &str = "Upstream error";
pub const REQUEST_FAILED: &str = "Request failed";
pub const INVALID_REQUEST_BODY: &str = "Invalid request body";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorEnvelope {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// One-line rendering used for operator-facing messages
    pub fn summary(&self) -> String {
        match &self.details {
            None | Some(Value::Null) => self.error.clone(),
            Some(Value::String(text)) if text.is_empty() => self.error.clone(),
            Some(Value::String(text)) => format!("{}: {}", self.error, text),
            Some(other) => format!("{}: {}", self.error, other),
        }
    }
}
