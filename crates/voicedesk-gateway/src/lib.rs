//! VoiceDesk Gateway - Forwarders to the upstream voice platform
//!
//! Each forwarder checks that the server-held credential is configured,
//! forwards the request with the credential attached, and normalizes the
//! upstream answer:
//!
//! ```text
//! credential missing   → GatewayError::Configuration   (no outbound call)
//! transport failure    → GatewayError::Transport(text)
//! non-2xx from upstream→ GatewayError::Upstream { status, details }
//! 2xx                  → parsed body, unchanged
//! ```
//!
//! The outbound HTTP call sits behind [`UpstreamTransport`] so the gateway can
//! be exercised without a network.

pub mod config;
pub mod error;
pub mod gateway;
pub mod transport;

pub use config::{GatewayConfig, API_KEY_ENV, API_BASE_ENV, DEFAULT_API_BASE};
pub use error::{GatewayError, GatewayResult};
pub use gateway::{Gateway, VoiceQuery};
pub use transport::{ReqwestTransport, UpstreamRequest, UpstreamResponse, UpstreamTransport};
