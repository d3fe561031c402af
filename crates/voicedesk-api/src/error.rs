//! API error handling
//!
//! Maps gateway failures onto the proxy error envelope.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use thiserror::Error;

use voicedesk_gateway::GatewayError;
use voicedesk_types::{ErrorEnvelope, INVALID_REQUEST_BODY, REQUEST_FAILED, UPSTREAM_ERROR};

/// API result type
pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("Invalid request body: {0}")]
    InvalidRequestBody(String),
}

impl ApiError {
    /// Get the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Gateway(GatewayError::Upstream { status, .. }) => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Self::Gateway(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Body sent back to the caller
    pub fn envelope(&self) -> ErrorEnvelope {
        match self {
            Self::Gateway(err @ GatewayError::Configuration) => ErrorEnvelope::new(err.to_string()),
            Self::Gateway(GatewayError::Upstream { details, .. }) => {
                ErrorEnvelope::new(UPSTREAM_ERROR).with_details(details.clone())
            }
            Self::Gateway(GatewayError::Transport(text))
            | Self::Gateway(GatewayError::InvalidBaseUrl(text)) => {
                ErrorEnvelope::new(REQUEST_FAILED).with_details(Value::String(text.clone()))
            }
            Self::InvalidRequestBody(text) => {
                ErrorEnvelope::new(INVALID_REQUEST_BODY).with_details(Value::String(text.clone()))
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.envelope())).into_response()
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidRequestBody(err.to_string())
    }
}
