//! Google Generative Language API client.
//!
//! This module implements [`CompletionClient`] for the Gemini
//! `:generateContent` endpoint. One call is one non-streaming request.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{AnalysisPrompt, CompletionClient, EndpointError, ModelEndpoint};

/// Harm categories whose blocking threshold is relaxed; legal text about
/// penalties, eviction or violence otherwise trips false-positive refusals.
const RELAXED_HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// Finish reasons that mean the completion was withheld.
const BLOCKED_FINISH_REASONS: [&str; 2] = ["SAFETY", "RECITATION"];

/// Generation parameters sent with every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            top_k: 40,
            top_p: 0.8,
            max_output_tokens: 4096,
        }
    }
}

/// Client for Gemini `generateContent` endpoints.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    generation: GenerationSettings,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("generation", &self.generation)
            .finish()
    }
}

impl GeminiClient {
    /// Create a client. Without an API key every call fails fast with
    /// [`EndpointError::MissingApiKey`].
    #[must_use]
    pub fn new(api_key: Option<String>, generation: GenerationSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            generation,
        }
    }

    /// Build the JSON request body for a prompt.
    #[must_use]
    pub fn request_body(&self, prompt: &AnalysisPrompt) -> serde_json::Value {
        let safety_settings: Vec<_> = RELAXED_HARM_CATEGORIES
            .iter()
            .map(|category| json!({ "category": category, "threshold": "BLOCK_NONE" }))
            .collect();

        json!({
            "contents": [
                {
                    "role": "user",
                    "parts": [
                        { "text": prompt.system() },
                        { "text": prompt.task() }
                    ]
                }
            ],
            "generationConfig": {
                "temperature": self.generation.temperature,
                "topK": self.generation.top_k,
                "topP": self.generation.top_p,
                "maxOutputTokens": self.generation.max_output_tokens,
            },
            "safetySettings": safety_settings,
        })
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    finish_reason: Option<String>,
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    text: Option<String>,
}

/// Pull the API error message out of an error body, if there is one.
fn api_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")?
        .get("message")?
        .as_str()
        .map(ToString::to_string)
}

/// Extract the usable completion text from a successful response body.
pub(crate) fn completion_text(body: &str) -> Result<String, EndpointError> {
    let response: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|e| EndpointError::Transport(format!("malformed response body: {e}")))?;

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or(EndpointError::NoCandidates)?;

    if let Some(reason) = candidate.finish_reason.as_deref() {
        if BLOCKED_FINISH_REASONS.contains(&reason) {
            return Err(EndpointError::Blocked(reason.to_string()));
        }
    }

    candidate
        .content
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .ok_or(EndpointError::EmptyCompletion)
}

#[async_trait::async_trait]
impl CompletionClient for GeminiClient {
    async fn complete(
        &self,
        endpoint: &ModelEndpoint,
        prompt: &AnalysisPrompt,
    ) -> Result<String, EndpointError> {
        let api_key = self.api_key.as_deref().ok_or(EndpointError::MissingApiKey)?;

        let response = self
            .http
            .post(&endpoint.url)
            .query(&[("key", api_key)])
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| EndpointError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| EndpointError::Transport(e.to_string()))?;

        if !status.is_success() {
            let message = api_error_message(&body).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
            return Err(EndpointError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let text = completion_text(&body)?;
        tracing::debug!(
            name: "analysis.completion.received",
            endpoint = %endpoint.name,
            chars = text.chars().count(),
            preview = %text.chars().take(200).collect::<String>(),
            "Raw completion received"
        );
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;

    fn prompt() -> AnalysisPrompt {
        AnalysisPrompt::build("Agreement text", Language::English, 10_000)
    }

    #[test]
    fn test_request_body_shape() {
        let client = GeminiClient::new(Some("k".to_string()), GenerationSettings::default());
        let body = client.request_body(&prompt());

        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"].as_array().unwrap().len(), 2);
        assert_eq!(body["generationConfig"]["topK"], 40);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 4096);
        assert_eq!(body["safetySettings"].as_array().unwrap().len(), 4);
        assert_eq!(body["safetySettings"][0]["threshold"], "BLOCK_NONE");
    }

    #[test]
    fn test_completion_text_ok() {
        let body = r#"{"candidates":[{"finishReason":"STOP","content":{"parts":[{"text":"{}"}]}}]}"#;
        assert_eq!(completion_text(body).unwrap(), "{}");
    }

    #[test]
    fn test_completion_text_blocked() {
        let body = r#"{"candidates":[{"finishReason":"SAFETY"}]}"#;
        assert_eq!(
            completion_text(body),
            Err(EndpointError::Blocked("SAFETY".to_string()))
        );

        let body = r#"{"candidates":[{"finishReason":"RECITATION","content":{"parts":[{"text":"x"}]}}]}"#;
        assert_eq!(
            completion_text(body),
            Err(EndpointError::Blocked("RECITATION".to_string()))
        );
    }

    #[test]
    fn test_completion_text_without_candidates() {
        assert_eq!(completion_text("{}"), Err(EndpointError::NoCandidates));
        assert_eq!(
            completion_text(r#"{"candidates":[]}"#),
            Err(EndpointError::NoCandidates)
        );
    }

    #[test]
    fn test_api_error_message() {
        let body = r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(api_error_message(body).as_deref(), Some("Quota exceeded"));
        assert_eq!(api_error_message("<html>"), None);
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_request() {
        let client = GeminiClient::new(Some("  ".to_string()), GenerationSettings::default());
        let endpoint = ModelEndpoint::new("m", "http://127.0.0.1:9/unreachable");
        assert_eq!(
            client.complete(&endpoint, &prompt()).await,
            Err(EndpointError::MissingApiKey)
        );
    }
}
