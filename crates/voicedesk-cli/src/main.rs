//! VoiceDesk CLI - Terminal console for voice agents
//!
//! Talks to a running VoiceDesk gateway (default: http://localhost:3000).
//! The gateway holds the upstream credential; the CLI never needs it.
//!
//! # Quick Start
//!
//! ```bash
//! # Start the gateway first (in one terminal)
//! VOICEDESK_API_KEY=... cargo run -p voicedesk-server
//!
//! # Then use the CLI
//! voicedesk agents
//! voicedesk show <agent_id>
//! voicedesk save <agent_id> --first-message "Hi, this is Ava"
//! voicedesk call <agent_id> --to +15550100 --var customer_name=Sam
//! ```

use clap::{Parser, Subcommand};
use colored::*;

mod commands;
mod display;
mod player;

use commands::{agent, call, catalog};
use voicedesk_session::client::DEFAULT_SERVER_URL;
use voicedesk_session::ProxyClient;

/// VoiceDesk CLI - browse, edit and call voice agents
#[derive(Parser)]
#[command(name = "voicedesk")]
#[command(author = "VoiceDesk Contributors")]
#[command(version)]
#[command(about = "Operator console for conversational voice agents", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Gateway URL
    #[arg(long, global = true, env = "VOICEDESK_SERVER", default_value = DEFAULT_SERVER_URL)]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the gateway is up and configured
    Status,

    /// List agents
    Agents,

    /// Show an agent's greeting, prompt, voice, numbers and variables
    Show {
        /// Agent ID
        agent_id: String,
    },

    /// List voices
    Voices {
        /// Resolve (and play) the preview of this voice
        #[arg(long)]
        preview: Option<String>,

        /// Command used to play previews, e.g. "ffplay -nodisp -autoexit"
        #[arg(long, env = "VOICEDESK_PLAYER")]
        player: Option<String>,
    },

    /// Update an agent's greeting, prompt or voice
    Save {
        /// Agent ID
        agent_id: String,

        /// New first message
        #[arg(long)]
        first_message: Option<String>,

        /// New system prompt
        #[arg(long)]
        prompt: Option<String>,

        /// New voice ID
        #[arg(long)]
        voice: Option<String>,
    },

    /// Start an outbound call and follow the conversation
    Call {
        /// Agent ID
        agent_id: String,

        /// Destination phone number
        #[arg(long)]
        to: String,

        /// Agent phone number ID to call from (defaults to the agent's first number)
        #[arg(long)]
        from: Option<String>,

        /// Dynamic variable value, repeatable
        #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_var)]
        vars: Vec<(String, String)>,
    },
}

fn parse_var(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{}'", raw)),
    }
}

#[tokio::main]
async fn main() {
    // Load .env if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        display::error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let client = ProxyClient::new(&cli.server)?;
    println!(
        "  {} {}",
        "VoiceDesk".bright_white().bold(),
        client.base_url().as_str().bright_black()
    );

    match cli.command {
        Commands::Status => catalog::status(&client).await,
        Commands::Agents => catalog::agents(&commands::session(client)).await,
        Commands::Show { agent_id } => catalog::show(&commands::session(client), &agent_id).await,
        Commands::Voices { preview, player } => catalog::voices(client, preview, player).await,
        Commands::Save {
            agent_id,
            first_message,
            prompt,
            voice,
        } => {
            agent::save(
                &commands::session(client),
                &agent_id,
                first_message,
                prompt,
                voice,
            )
            .await
        }
        Commands::Call {
            agent_id,
            to,
            from,
            vars,
        } => call::run(&commands::session(client), &agent_id, to, from, vars).await,
    }
}
