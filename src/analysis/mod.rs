//! Multi-model document analysis.
//!
//! This module turns extracted document text into a structured
//! [`AnalysisResult`] by querying remote generative models.
//!
//! # Overview
//!
//! The [`CompletionClient`] trait is the network seam: given one
//! [`ModelEndpoint`] and an [`AnalysisPrompt`] it returns the raw model
//! completion. The [`AnalysisPipeline`] builds the prompt once, walks the
//! configured endpoints in order, and validates and repairs each completion
//! until one yields a usable result.
//!
//! # Clients
//!
//! - [`GeminiClient`]: Google Generative Language API (`:generateContent`)
//!
//! # Example
//!
//! ```rust,ignore
//! use legal_lens::analysis::{AnalysisPipeline, GeminiClient, ModelEndpoint};
//! use legal_lens::language::Language;
//!
//! let client = Arc::new(GeminiClient::new(Some(api_key), GenerationSettings::default()));
//! let pipeline = AnalysisPipeline::new(ModelEndpoint::defaults(), client);
//! let result = pipeline.analyze(&text, Language::English).await?;
//! ```

pub mod gemini;
pub mod pipeline;
pub mod prompt;
pub mod repair;

pub use gemini::{GeminiClient, GenerationSettings};
pub use pipeline::{AnalysisOutcome, AnalysisPipeline};
pub use prompt::{AnalysisPrompt, TRUNCATION_MARKER};

use serde::{Deserialize, Serialize};

/// One candidate remote analysis provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelEndpoint {
    /// Model name, used in logs and error messages.
    pub name: String,
    /// Full `generateContent` URL (without the API key).
    pub url: String,
}

impl ModelEndpoint {
    /// Create an endpoint descriptor.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// The built-in fallback order: two fast `v1beta` models, then a larger `v1` model.
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        const BASE: &str = "https://generativelanguage.googleapis.com";
        vec![
            Self::new(
                "gemini-1.5-flash-8b",
                format!("{BASE}/v1beta/models/gemini-1.5-flash-8b:generateContent"),
            ),
            Self::new(
                "gemini-1.5-flash",
                format!("{BASE}/v1beta/models/gemini-1.5-flash:generateContent"),
            ),
            Self::new(
                "gemini-2.5-pro",
                format!("{BASE}/v1/models/gemini-2.5-pro:generateContent"),
            ),
        ]
    }
}

/// Overall risk rating of a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Parse a model-supplied rating. Case and surrounding whitespace are ignored.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "LOW" => Some(Self::Low),
            "MEDIUM" => Some(Self::Medium),
            "HIGH" => Some(Self::High),
            "CRITICAL" => Some(Self::Critical),
            _ => None,
        }
    }

    /// Wire representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

/// A document term with a plain-language explanation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyTerm {
    #[serde(default)]
    pub term: String,
    #[serde(default)]
    pub explanation: String,
}

/// A clause that carries risk for the reader, and why.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskyClause {
    #[serde(default)]
    pub clause: String,
    #[serde(default)]
    pub risk: String,
}

/// Structured analysis of one document.
///
/// This is the wire contract between the pipeline and the presentation
/// layer. Every list is non-empty once the result has been through
/// [`repair::repair`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub document_type: String,
    pub simple_summary: String,
    pub key_terms: Vec<KeyTerm>,
    pub risky_clauses_list: Vec<RiskyClause>,
    pub risk_level: RiskLevel,
    pub recommendations: Vec<String>,
}

/// Why a single endpoint attempt produced no usable result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EndpointError {
    /// No API key is configured, so the request was never sent.
    #[error("API key not configured")]
    MissingApiKey,

    /// The request could not be sent or the body could not be read.
    #[error("{0}")]
    Transport(String),

    /// The provider answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The response carried no candidates.
    #[error("no candidates in response")]
    NoCandidates,

    /// The completion was stopped by a provider-side filter.
    #[error("content blocked: {0}")]
    Blocked(String),

    /// The candidate carried no text part.
    #[error("empty completion")]
    EmptyCompletion,

    /// No `{ ... }` span could be found in the completion.
    #[error("no JSON object found in response")]
    NoJson,

    /// The isolated JSON candidate did not parse.
    #[error("invalid JSON in response: {0}")]
    InvalidJson(String),

    /// The result parsed but looks generic rather than document-specific.
    #[error("generic response: documentType {0:?} is missing or too short")]
    Generic(String),
}

/// Terminal failure of an analysis run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    /// The text is too short to analyze; nothing was sent.
    #[error("document text too short for analysis ({chars} characters, minimum {min})")]
    TextTooShort { chars: usize, min: usize },

    /// The pipeline was built without endpoints.
    #[error("no model endpoints configured")]
    NoEndpoints,

    /// Every endpoint was tried and none produced a usable result.
    #[error("All models failed after {attempts} attempts. Last error: {last_error}")]
    Exhausted { attempts: usize, last_error: String },
}

/// Fetches a raw completion for a prompt from one endpoint.
///
/// Implementations perform exactly one request per call and must not retry.
#[async_trait::async_trait]
pub trait CompletionClient: Send + Sync + std::fmt::Debug {
    /// Send `prompt` to `endpoint` and return the completion text.
    async fn complete(
        &self,
        endpoint: &ModelEndpoint,
        prompt: &AnalysisPrompt,
    ) -> Result<String, EndpointError>;
}
