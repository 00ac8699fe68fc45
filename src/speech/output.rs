//! Audio playback through external commands.

use std::process::Stdio;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use super::SpeechOutcome;

/// `espeak-ng` speaking rate at 1.0, in words per minute.
const ESPEAK_BASE_WPM: f32 = 175.0;

/// Plays a [`SpeechOutcome`] until it finishes or is cancelled.
#[async_trait]
pub trait AudioOutput: Send + Sync + std::fmt::Debug {
    async fn play(&self, outcome: &SpeechOutcome, cancel: CancellationToken) -> Result<()>;
}

/// Plays remote MP3 audio through a player command reading stdin, and local
/// speech through `espeak-ng`.
#[derive(Debug, Clone)]
pub struct CommandAudioOutput {
    player: Vec<String>,
    voice_program: String,
}

impl CommandAudioOutput {
    /// `player_command` is split on whitespace, e.g. `mpg123 -q -`.
    pub fn new(player_command: &str) -> Self {
        Self {
            player: player_command.split_whitespace().map(String::from).collect(),
            voice_program: "espeak-ng".to_string(),
        }
    }

    fn local_args(text: &str, locale: &str, rate: f32) -> Vec<String> {
        let voice = locale.split('-').next().unwrap_or("en").to_lowercase();
        #[allow(clippy::cast_sign_loss)]
        let wpm = (ESPEAK_BASE_WPM * rate).round().max(80.0) as u32;
        vec![
            "-v".to_string(),
            voice,
            "-s".to_string(),
            wpm.to_string(),
            text.to_string(),
        ]
    }

    fn command_for(&self, outcome: &SpeechOutcome) -> Result<Command> {
        let mut command = match outcome {
            SpeechOutcome::Remote { .. } => {
                let (program, args) = self
                    .player
                    .split_first()
                    .context("no audio player command configured")?;
                let mut command = Command::new(program);
                command.args(args).stdin(Stdio::piped());
                command
            }
            SpeechOutcome::Local { text, locale, rate } => {
                let mut command = Command::new(&self.voice_program);
                command
                    .args(Self::local_args(text, locale, *rate))
                    .stdin(Stdio::null());
                command
            }
        };
        command
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        Ok(command)
    }
}

#[async_trait]
impl AudioOutput for CommandAudioOutput {
    async fn play(&self, outcome: &SpeechOutcome, cancel: CancellationToken) -> Result<()> {
        let mut child = self
            .command_for(outcome)?
            .spawn()
            .context("failed to start audio command")?;

        if let (SpeechOutcome::Remote { audio, .. }, Some(mut stdin)) = (outcome, child.stdin.take())
        {
            let audio = audio.clone();
            tokio::spawn(async move {
                // The player may exit early on cancel; a broken pipe is expected then.
                let _ = stdin.write_all(&audio).await;
                let _ = stdin.shutdown().await;
            });
        }

        tokio::select! {
            status = child.wait() => {
                let status = status?;
                if !status.success() {
                    anyhow::bail!("audio command exited with {status}");
                }
            }
            () = cancel.cancelled() => {
                child.kill().await.context("failed to stop audio command")?;
                tracing::debug!(name: "speech.playback.killed", "Playback cancelled");
            }
        }
        Ok(())
    }
}
