use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartError},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use tracing::info;

use crate::AppState;
use crate::analysis::{AnalysisError, AnalysisResult};
use crate::config::AppConfig;
use crate::error::IntakeError;
use crate::intake::{AdmissionError, DocumentKind, DocumentText};
use crate::language::Language;
use crate::speech::SpeechOutcome;

/// Room for multipart framing and the `language` field on top of the file.
const BODY_LIMIT_MARGIN: usize = 1024 * 1024;

/// File name reported for pasted text.
const PASTED_TEXT_NAME: &str = "pasted-text.txt";

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    info!(
        name: "analysis.config.loaded",
        endpoints = ?config.analysis.endpoints.iter().map(|e| e.name.as_str()).collect::<Vec<_>>(),
        api_key_configured = config.analysis.api_key.is_some(),
        tts_key_configured = config.speech.api_key.is_some(),
        "Analysis configuration loaded"
    );

    let state = AppState::from_config(Arc::clone(&config));
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

/// Build the HTTP API router around `state`.
pub fn build_router(state: AppState) -> Router {
    let max_upload = usize::try_from(state.intake.policy().max_bytes()).unwrap_or(usize::MAX);

    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/analyze", post(api_analyze))
        .route("/api/analyze/text", post(api_analyze_text))
        .route("/api/language", post(api_language))
        .route("/api/speech", post(api_speech))
        .layer(DefaultBodyLimit::max(max_upload.saturating_add(BODY_LIMIT_MARGIN)))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ─────────────────────────────────────────────────────────────────────────────
// Analysis
// ─────────────────────────────────────────────────────────────────────────────

/// An [`AnalysisResult`] plus what the caller needs to present it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    #[serde(flatten)]
    pub result: AnalysisResult,
    pub file_name: String,
    pub word_count: usize,
    /// Language the analysis was written in.
    pub detected_language: Language,
    pub language_code: &'static str,
    pub characters: usize,
    /// Whether only the head of the document was analyzed.
    pub truncated: bool,
    /// Endpoint that produced the result.
    pub model: String,
}

/// Detect (or apply) the language, run the pipeline, and assemble the report.
///
/// A non-blank `language` label overrides detection.
pub async fn analyze_document(
    state: &AppState,
    document: &DocumentText,
    language: Option<&str>,
) -> Result<AnalysisReport, IntakeError> {
    let language = match language.filter(|l| !l.trim().is_empty()) {
        Some(label) => Language::from_label(label),
        None => Language::detect(document.text()),
    };

    let outcome = state.pipeline.run(document.text(), language).await?;

    Ok(AnalysisReport {
        result: outcome.result,
        file_name: document.file_name().to_string(),
        word_count: document.word_count(),
        detected_language: language,
        language_code: language.locale(),
        characters: document.char_count(),
        truncated: outcome.truncated,
        model: outcome.endpoint,
    })
}

/// GET /healthz
async fn healthz() -> &'static str {
    "ok"
}

/// POST /api/analyze - multipart upload with a `file` part and optional `language`.
async fn api_analyze(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AnalysisReport>, ApiError> {
    let mut upload = None;
    let mut language = None;

    while let Some(field) = multipart.next_field().await.map_err(ApiError::multipart)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field
                    .file_name()
                    .map_or_else(|| format!("upload-{}", uuid::Uuid::new_v4()), str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await.map_err(ApiError::multipart)?;
                upload = Some((file_name, content_type, data));
            }
            Some("language") => {
                language = Some(field.text().await.map_err(ApiError::multipart)?);
            }
            _ => {}
        }
    }

    let (file_name, content_type, data) = upload
        .ok_or_else(|| ApiError::bad_request("MISSING_FILE", "No file was uploaded."))?;

    info!(
        name: "upload.received",
        file = %file_name,
        content_type = ?content_type,
        bytes = data.len(),
        "Document uploaded"
    );

    let document = state
        .intake
        .process(&file_name, content_type.as_deref(), &data)
        .await?;
    let report = analyze_document(&state, &document, language.as_deref()).await?;
    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeTextRequest {
    text: String,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    file_name: Option<String>,
}

/// POST /api/analyze/text - analyze already-extracted text.
async fn api_analyze_text(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeTextRequest>,
) -> Result<Json<AnalysisReport>, ApiError> {
    let file_name = req
        .file_name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| PASTED_TEXT_NAME.to_string());
    let document = DocumentText::new(file_name, DocumentKind::PlainText, req.text);

    let report = analyze_document(&state, &document, req.language.as_deref()).await?;
    Ok(Json(report))
}

// ─────────────────────────────────────────────────────────────────────────────
// Language & speech
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct LanguageRequest {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LanguageResponse {
    language: Language,
    language_code: &'static str,
}

/// POST /api/language
async fn api_language(Json(req): Json<LanguageRequest>) -> Json<LanguageResponse> {
    let language = Language::detect(&req.text);
    Json(LanguageResponse {
        language,
        language_code: language.locale(),
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpeechRequest {
    text: String,
    #[serde(default)]
    language_code: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase", rename_all_fields = "camelCase")]
enum SpeechResponse {
    Remote {
        mime_type: &'static str,
        audio_content: String,
    },
    Local {
        text: String,
        language_code: String,
        rate: f32,
    },
}

impl From<SpeechOutcome> for SpeechResponse {
    fn from(outcome: SpeechOutcome) -> Self {
        match outcome {
            SpeechOutcome::Remote { audio, mime_type } => Self::Remote {
                mime_type,
                audio_content: base64::engine::general_purpose::STANDARD.encode(audio),
            },
            SpeechOutcome::Local { text, locale, rate } => Self::Local {
                text,
                language_code: locale,
                rate,
            },
        }
    }
}

/// POST /api/speech - synthesize, or tell the client to speak locally.
async fn api_speech(
    State(state): State<AppState>,
    Json(req): Json<SpeechRequest>,
) -> Result<Json<SpeechResponse>, ApiError> {
    if req.text.trim().is_empty() {
        return Err(ApiError::bad_request("EMPTY_TEXT", "Nothing to read aloud."));
    }
    let locale = req
        .language_code
        .filter(|l| !l.trim().is_empty())
        .unwrap_or_else(|| Language::default().locale().to_string());

    let outcome = state.speech.speak(&req.text, &locale).await;
    Ok(Json(outcome.into()))
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// JSON error body `{error, code}` with an HTTP status.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code,
            message: message.into(),
        }
    }

    fn multipart(err: MultipartError) -> Self {
        let status = err.status();
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            return Self {
                status,
                code: "FILE_TOO_LARGE",
                message: "File exceeds the maximum allowed upload size.".to_string(),
            };
        }
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "MULTIPART_ERROR",
            message: format!("Failed to read upload: {}", err.body_text()),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<IntakeError> for ApiError {
    fn from(err: IntakeError) -> Self {
        let status = match &err {
            IntakeError::Admission(AdmissionError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            IntakeError::Admission(AdmissionError::Unsupported { .. }) => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            IntakeError::Extraction(_) | IntakeError::Analysis(AnalysisError::TextTooShort { .. }) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            IntakeError::Analysis(_) => StatusCode::BAD_GATEWAY,
        };

        tracing::warn!(
            name: "request.failed",
            code = err.code(),
            status = status.as_u16(),
            error = %err,
            "Request failed"
        );

        Self {
            status,
            code: err.code(),
            message: err.user_message(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({ "error": self.message, "code": self.code })),
        )
            .into_response()
    }
}
