//! VoiceDesk Gateway Server
//!
//! Serves the VoiceDesk proxy API. The server holds the upstream voice
//! platform credential and attaches it to every forwarded request; browser
//! and terminal consoles only ever talk to this server.
//!
//! # Usage
//!
//! ```bash
//! # Start with the credential from the environment
//! VOICEDESK_API_KEY=... voicedesk-server
//!
//! # Start with a config file
//! voicedesk-server --config /path/to/config.toml
//!
//! # Start with environment overrides
//! VOICEDESK__SERVER__PORT=8080 voicedesk-server
//! ```

mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use clap::Parser;
use tokio::signal;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use voicedesk_api::{create_router, ApiConfig, AppState};
use voicedesk_gateway::{Gateway, GatewayConfig, ReqwestTransport, API_BASE_ENV, API_KEY_ENV};

use crate::config::ServerConfig;

// =============================================================================
// CLI Arguments
// =============================================================================

/// VoiceDesk Gateway Server - credential-holding proxy for voice agents
#[derive(Parser, Debug)]
#[command(name = "voicedesk-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (TOML, JSON, or YAML)
    #[arg(short, long, env = "VOICEDESK_CONFIG")]
    config: Option<String>,

    /// Host to bind to
    #[arg(long, env = "VOICEDESK_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "VOICEDESK_PORT")]
    port: Option<u16>,

    /// Upstream platform API key
    #[arg(long, env = API_KEY_ENV, hide_env_values = true)]
    api_key: Option<String>,

    /// Upstream platform base URL
    #[arg(long, env = API_BASE_ENV)]
    api_base: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "VOICEDESK_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format (json, pretty)
    #[arg(long, env = "VOICEDESK_LOG_FORMAT")]
    log_format: Option<String>,
}

impl Args {
    /// Override loaded configuration with explicit arguments
    fn apply(self, config: &mut ServerConfig) {
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(api_key) = self.api_key {
            config.upstream.api_key = Some(api_key);
        }
        if let Some(api_base) = self.api_base {
            config.upstream.base_url = api_base;
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
    }
}

// =============================================================================
// Main Entry Point
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Load configuration
    let mut server_config = ServerConfig::load(args.config.as_deref())?;
    args.apply(&mut server_config);

    // Initialize logging
    init_logging(&server_config.logging)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting VoiceDesk gateway"
    );

    // Validate configuration
    validate_config(&server_config)?;

    // Create router
    let app = build_app(&server_config)?;

    // Start metrics server if enabled
    if server_config.metrics.enabled {
        start_metrics_server(&server_config.metrics)?;
    }

    // Get bind address
    let addr = server_config.server.socket_addr()?;

    tracing::info!(
        host = %server_config.server.host,
        port = %server_config.server.port,
        upstream = %server_config.upstream.base_url,
        "Server listening"
    );

    // Start server with graceful shutdown
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}

// =============================================================================
// Initialization Functions
// =============================================================================

/// Initialize tracing/logging
fn init_logging(config: &config::LoggingConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))?;

    let subscriber = tracing_subscriber::registry().with(env_filter);

    match config.format.as_str() {
        "json" => {
            subscriber
                .with(fmt::layer().json().with_target(true))
                .try_init()?;
        }
        _ => {
            subscriber
                .with(fmt::layer().pretty().with_target(true))
                .try_init()?;
        }
    }

    Ok(())
}

/// Validate configuration
fn validate_config(config: &ServerConfig) -> anyhow::Result<()> {
    // Without a key the server still answers: every proxy call reports the
    // configuration error to the console.
    if !config.upstream.has_credential() {
        tracing::warn!(
            "{} is not set - every proxied request will fail until it is configured",
            API_KEY_ENV
        );
    }

    if config.server.request_timeout_secs == 0 {
        anyhow::bail!("server.request_timeout_secs must be greater than zero");
    }

    if config.upstream.request_timeout_secs == 0 {
        anyhow::bail!("upstream.request_timeout_secs must be greater than zero");
    }

    if config.logging.format != "json" && config.logging.format != "pretty" {
        tracing::warn!(format = %config.logging.format, "Unknown log format, using pretty");
    }

    Ok(())
}

/// Build the gateway and the HTTP router from configuration
fn build_app(config: &ServerConfig) -> anyhow::Result<Router> {
    let upstream = &config.upstream;
    let gateway_config = GatewayConfig::new(upstream.api_key.clone(), &upstream.base_url)?
        .with_timeout(upstream.request_timeout());
    let transport = ReqwestTransport::new(gateway_config.request_timeout)?;
    let gateway = Gateway::new(gateway_config, Arc::new(transport));

    let state = Arc::new(AppState::new(gateway));

    let api_config = ApiConfig {
        enable_cors: config.api.enable_cors,
        cors_origins: config.api.cors_origins.clone(),
        enable_compression: config.api.enable_compression,
        enable_tracing: config.api.enable_tracing,
        request_timeout: config.server.request_timeout(),
        max_body_size: config.api.max_body_size,
    };

    Ok(create_router(state, api_config))
}

/// Start Prometheus metrics server
fn start_metrics_server(config: &config::MetricsConfig) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    tracing::info!(port = config.port, "Starting metrics server");

    // The exporter serves scrapes from its own background task
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;

    Ok(())
}

// =============================================================================
// Graceful Shutdown
// =============================================================================

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
