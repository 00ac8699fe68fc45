//! Read-aloud support for analysis summaries.
//!
//! [`SpeechAdapter`] asks a remote [`SpeechSynthesizer`] for MP3 audio and
//! degrades to a local voice whenever that fails, so callers always get
//! something playable. [`SpeechPlayer`] owns the single in-flight playback
//! and turns a button press into play-or-stop.

mod google;
mod output;
mod player;

pub use google::{GoogleTts, voice_for};
pub use output::{AudioOutput, CommandAudioOutput};
pub use player::{PlaybackState, SpeechPlayer, ToggleAction};

use std::sync::Arc;

use async_trait::async_trait;

/// MIME type of remotely synthesized audio.
pub const REMOTE_AUDIO_MIME: &str = "audio/mpeg";

/// Speaking rate of the local fallback voice.
pub const DEFAULT_FALLBACK_RATE: f32 = 0.85;

/// What to play for one read-aloud request.
#[derive(Debug, Clone, PartialEq)]
pub enum SpeechOutcome {
    /// Synthesized audio from the remote service.
    Remote {
        audio: Vec<u8>,
        mime_type: &'static str,
    },
    /// Text to be spoken by a local voice.
    Local {
        text: String,
        locale: String,
        rate: f32,
    },
}

impl SpeechOutcome {
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }
}

/// Turns text into encoded audio.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync + std::fmt::Debug {
    /// Synthesize `text` in the voice for `locale` and return MP3 bytes.
    async fn synthesize(&self, text: &str, locale: &str) -> anyhow::Result<Vec<u8>>;
}

/// Remote synthesis with a local fallback.
#[derive(Debug, Clone)]
pub struct SpeechAdapter {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    fallback_rate: f32,
}

impl SpeechAdapter {
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>, fallback_rate: f32) -> Self {
        Self {
            synthesizer,
            fallback_rate,
        }
    }

    /// Produce something playable for `text`. Never fails.
    pub async fn speak(&self, text: &str, locale: &str) -> SpeechOutcome {
        match self.synthesizer.synthesize(text, locale).await {
            Ok(audio) => {
                tracing::debug!(
                    name: "speech.remote.succeeded",
                    locale = %locale,
                    bytes = audio.len(),
                    "Remote speech synthesized"
                );
                SpeechOutcome::Remote {
                    audio,
                    mime_type: REMOTE_AUDIO_MIME,
                }
            }
            Err(err) => {
                tracing::warn!(
                    name: "speech.remote.failed",
                    locale = %locale,
                    error = %err,
                    "Remote speech failed, using local voice"
                );
                SpeechOutcome::Local {
                    text: text.to_string(),
                    locale: locale.to_string(),
                    rate: self.fallback_rate,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Failing;

    #[async_trait]
    impl SpeechSynthesizer for Failing {
        async fn synthesize(&self, _text: &str, _locale: &str) -> anyhow::Result<Vec<u8>> {
            anyhow::bail!("HTTP 403: API key not valid")
        }
    }

    #[derive(Debug)]
    struct Echo;

    #[async_trait]
    impl SpeechSynthesizer for Echo {
        async fn synthesize(&self, text: &str, _locale: &str) -> anyhow::Result<Vec<u8>> {
            Ok(text.as_bytes().to_vec())
        }
    }

    #[tokio::test]
    async fn test_failure_degrades_to_local() {
        let adapter = SpeechAdapter::new(Arc::new(Failing), DEFAULT_FALLBACK_RATE);
        let outcome = adapter.speak("Pay rent by the 5th.", "hi-IN").await;
        assert_eq!(
            outcome,
            SpeechOutcome::Local {
                text: "Pay rent by the 5th.".to_string(),
                locale: "hi-IN".to_string(),
                rate: 0.85,
            }
        );
    }

    #[tokio::test]
    async fn test_success_is_remote_mp3() {
        let adapter = SpeechAdapter::new(Arc::new(Echo), DEFAULT_FALLBACK_RATE);
        let outcome = adapter.speak("abc", "en-IN").await;
        assert!(outcome.is_remote());
        assert_eq!(
            outcome,
            SpeechOutcome::Remote {
                audio: b"abc".to_vec(),
                mime_type: "audio/mpeg",
            }
        );
    }
}
