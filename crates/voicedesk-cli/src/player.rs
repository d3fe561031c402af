//! Preview playback through an external command
//!
//! The configured command is run with the preview URL as its last argument,
//! e.g. `ffplay -nodisp -autoexit` or `mpv --no-video`. The child is killed
//! when playback is cancelled.

use async_trait::async_trait;
use tokio::process::Command;

use voicedesk_session::{PlaybackError, PreviewPlayer};

pub struct CommandPlayer {
    program: String,
    args: Vec<String>,
}

impl CommandPlayer {
    /// Parse a whitespace separated command line. Returns `None` when empty.
    pub fn parse(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }
}

#[async_trait]
impl PreviewPlayer for CommandPlayer {
    async fn play(&self, url: &str) -> Result<(), PlaybackError> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(url)
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| PlaybackError::Failed(format!("{}: {}", self.program, e)))?;

        if status.success() {
            Ok(())
        } else {
            Err(PlaybackError::Failed(format!("{} exited with {}", self.program, status)))
        }
    }
}
