//! Legal Lens
//!
//! Legal document intake for non-lawyers: upload a contract, lease or notice
//! and get a plain-language summary, key terms, risky clauses and a risk
//! rating, optionally read aloud.
//!
//! # Architecture
//!
//! - **Intake**: upload admission and text extraction (plain text, PDF, Word, OCR)
//! - **Language**: detection of the document language (English, Tamil, Hindi)
//! - **Analysis**: ordered multi-endpoint Gemini pipeline with JSON repair
//! - **Speech**: remote text-to-speech with a local voice fallback
//! - **Server**: Axum JSON API over all of the above
//!
//! # Modules
//!
//! - [`intake`]: admission policy and extraction backends
//! - [`analysis`]: prompt, completion client and fallback pipeline
//! - [`language`]: language identification
//! - [`speech`]: speech synthesis and playback
//! - [`error`]: user-facing error mapping

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]
#![allow(clippy::unused_async)]

pub mod analysis;
pub mod config;
pub mod error;
pub mod intake;
pub mod language;
pub mod server;
pub mod speech;

use crate::analysis::{AnalysisPipeline, CompletionClient, GeminiClient};
use crate::config::AppConfig;
use crate::intake::{DocumentExtractor, Intake};
use crate::speech::{GoogleTts, SpeechAdapter};

use std::sync::Arc;

/// Application state shared across all handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Global Configuration
    pub config: Arc<AppConfig>,
    /// Upload admission and text extraction.
    pub intake: Arc<Intake>,
    /// Multi-endpoint analysis pipeline.
    pub pipeline: Arc<AnalysisPipeline>,
    /// Speech synthesis with local fallback.
    pub speech: Arc<SpeechAdapter>,
}

impl AppState {
    /// Wire the production services from configuration.
    pub fn from_config(config: Arc<AppConfig>) -> Self {
        let client = GeminiClient::new(
            config.analysis.api_key.clone(),
            config.analysis.generation(),
        );
        Self::with_completion_client(config, Arc::new(client))
    }

    /// Like [`AppState::from_config`], with a custom completion client.
    pub fn with_completion_client(
        config: Arc<AppConfig>,
        client: Arc<dyn CompletionClient>,
    ) -> Self {
        let extractor = DocumentExtractor::new(config.extraction.clone())
            .with_min_chars(config.intake.min_text_chars);
        let intake = Intake::with_extractor(config.intake.policy(), extractor);

        let pipeline = AnalysisPipeline::new(config.analysis.endpoints.clone(), client)
            .with_min_chars(config.intake.min_text_chars)
            .with_max_chars(config.analysis.max_input_chars);

        let tts = GoogleTts::new(config.speech.api_key.clone(), config.speech.api_url.clone())
            .with_speaking_rate(config.speech.remote_rate);
        let speech = SpeechAdapter::new(Arc::new(tts), config.speech.fallback_rate);

        Self {
            config,
            intake: Arc::new(intake),
            pipeline: Arc::new(pipeline),
            speech: Arc::new(speech),
        }
    }
}
