//! Google Cloud Text-to-Speech client.

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::Engine as _;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::SpeechSynthesizer;

/// Locales with a dedicated voice.
const VOICES: [(&str, &str); 5] = [
    ("en-IN", "en-IN-Standard-A"),
    ("hi-IN", "hi-IN-Standard-A"),
    ("ta-IN", "ta-IN-Standard-A"),
    ("te-IN", "te-IN-Standard-A"),
    ("kn-IN", "kn-IN-Standard-A"),
];

/// Voice `(languageCode, name)` for a locale; unknown locales get `en-IN`.
#[must_use]
pub fn voice_for(locale: &str) -> (&'static str, &'static str) {
    VOICES
        .iter()
        .copied()
        .find(|(code, _)| code.eq_ignore_ascii_case(locale.trim()))
        .unwrap_or(VOICES[0])
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: Option<String>,
}

/// Remote synthesizer backed by the Cloud Text-to-Speech `text:synthesize`
/// endpoint. Without an API key every call fails, so callers fall back to
/// the local voice.
#[derive(Clone)]
pub struct GoogleTts {
    client: Client,
    api_key: Option<String>,
    api_url: String,
    speaking_rate: f32,
}

impl std::fmt::Debug for GoogleTts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleTts")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_url", &self.api_url)
            .field("speaking_rate", &self.speaking_rate)
            .finish()
    }
}

impl GoogleTts {
    pub fn new(api_key: Option<String>, api_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            api_url: api_url.into(),
            speaking_rate: 0.9,
        }
    }

    #[must_use]
    pub fn with_speaking_rate(mut self, rate: f32) -> Self {
        self.speaking_rate = rate;
        self
    }

    pub fn request_body(&self, text: &str, locale: &str) -> serde_json::Value {
        let (language_code, name) = voice_for(locale);
        json!({
            "input": { "text": text },
            "voice": { "languageCode": language_code, "name": name },
            "audioConfig": {
                "audioEncoding": "MP3",
                "pitch": 0,
                "speakingRate": self.speaking_rate,
            }
        })
    }
}

/// Decode the base64 `audioContent` of a synthesize response.
pub(crate) fn decode_audio(body: &str) -> Result<Vec<u8>> {
    let response: SynthesizeResponse =
        serde_json::from_str(body).context("malformed synthesize response")?;
    let encoded = response
        .audio_content
        .filter(|a| !a.is_empty())
        .context("no audio content in response")?;
    base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .context("audio content is not valid base64")
}

#[async_trait]
impl SpeechSynthesizer for GoogleTts {
    async fn synthesize(&self, text: &str, locale: &str) -> Result<Vec<u8>> {
        let api_key = self
            .api_key
            .as_deref()
            .context("Google TTS API key not configured")?;

        tracing::info!(
            name: "speech.remote.request",
            voice = voice_for(locale).1,
            chars = text.chars().count(),
            "Synthesizing speech"
        );

        let response = self
            .client
            .post(&self.api_url)
            .query(&[("key", api_key)])
            .json(&self.request_body(text, locale))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            anyhow::bail!("Google TTS returned HTTP {}: {}", status.as_u16(), body);
        }
        decode_audio(&body)
    }
}
