//! Ordered multi-endpoint analysis with first-success-wins fallback.
//!
//! The pipeline performs, for one document:
//! 1. Reject text below the minimum length (no network traffic)
//! 2. Truncate and build the prompt once
//! 3. Try each endpoint in configured order, exactly once
//! 4. Validate and repair the completion
//! 5. Return the first usable result, or the last recorded error

use std::sync::Arc;

use tracing::{info, warn};

use super::prompt::MAX_INPUT_CHARS;
use super::repair::interpret_completion;
use super::{
    AnalysisError, AnalysisPrompt, AnalysisResult, CompletionClient, EndpointError, ModelEndpoint,
};
use crate::language::Language;

/// Documents with fewer trimmed characters than this are rejected.
pub const MIN_INPUT_CHARS: usize = 50;

/// A successful analysis together with how it was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisOutcome {
    /// The validated, repaired result.
    pub result: AnalysisResult,
    /// Name of the endpoint that produced it.
    pub endpoint: String,
    /// Number of endpoints tried, including the successful one.
    pub attempts: usize,
    /// Whether the document was truncated before submission.
    pub truncated: bool,
}

/// Runs document analysis against an ordered list of model endpoints.
#[derive(Debug, Clone)]
pub struct AnalysisPipeline {
    endpoints: Vec<ModelEndpoint>,
    client: Arc<dyn CompletionClient>,
    min_chars: usize,
    max_chars: usize,
}

impl AnalysisPipeline {
    /// Create a pipeline with the default length limits.
    pub fn new(endpoints: Vec<ModelEndpoint>, client: Arc<dyn CompletionClient>) -> Self {
        Self {
            endpoints,
            client,
            min_chars: MIN_INPUT_CHARS,
            max_chars: MAX_INPUT_CHARS,
        }
    }

    /// Override the submission ceiling.
    #[must_use]
    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    /// Override the admission floor.
    #[must_use]
    pub fn with_min_chars(mut self, min_chars: usize) -> Self {
        self.min_chars = min_chars;
        self
    }

    /// Configured endpoints, in trial order.
    pub fn endpoints(&self) -> &[ModelEndpoint] {
        &self.endpoints
    }

    /// Analyze `text` and return the result.
    pub async fn analyze(
        &self,
        text: &str,
        language: Language,
    ) -> Result<AnalysisResult, AnalysisError> {
        self.run(text, language).await.map(|outcome| outcome.result)
    }

    /// Analyze `text`, also reporting which endpoint answered.
    pub async fn run(&self, text: &str, language: Language) -> Result<AnalysisOutcome, AnalysisError> {
        let chars = text.trim().chars().count();
        if chars < self.min_chars {
            return Err(AnalysisError::TextTooShort {
                chars,
                min: self.min_chars,
            });
        }
        if self.endpoints.is_empty() {
            return Err(AnalysisError::NoEndpoints);
        }

        let prompt = AnalysisPrompt::build(text, language, self.max_chars);
        info!(
            name: "analysis.started",
            chars = prompt.document().chars().count(),
            truncated = prompt.truncated(),
            language = %language,
            endpoints = self.endpoints.len(),
            "Starting document analysis"
        );

        let mut last_error: Option<EndpointError> = None;
        for (index, endpoint) in self.endpoints.iter().enumerate() {
            info!(
                name: "analysis.endpoint.attempt",
                endpoint = %endpoint.name,
                position = index + 1,
                "Trying model endpoint"
            );

            match self.attempt(endpoint, &prompt).await {
                Ok(result) => {
                    info!(
                        name: "analysis.endpoint.succeeded",
                        endpoint = %endpoint.name,
                        document_type = %result.document_type,
                        risk_level = result.risk_level.as_str(),
                        key_terms = result.key_terms.len(),
                        "Model endpoint produced a usable analysis"
                    );
                    return Ok(AnalysisOutcome {
                        result,
                        endpoint: endpoint.name.clone(),
                        attempts: index + 1,
                        truncated: prompt.truncated(),
                    });
                }
                Err(err) => {
                    warn!(
                        name: "analysis.endpoint.failed",
                        endpoint = %endpoint.name,
                        error = %err,
                        "Model endpoint failed, falling back"
                    );
                    last_error = Some(err);
                }
            }
        }

        let last_error = last_error.map_or_else(|| "unknown error".to_string(), |e| e.to_string());
        Err(AnalysisError::Exhausted {
            attempts: self.endpoints.len(),
            last_error,
        })
    }

    /// One endpoint, one request: fetch the completion and validate it.
    async fn attempt(
        &self,
        endpoint: &ModelEndpoint,
        prompt: &AnalysisPrompt,
    ) -> Result<AnalysisResult, EndpointError> {
        let raw = self.client.complete(endpoint, prompt).await?;
        interpret_completion(&raw)
    }
}
