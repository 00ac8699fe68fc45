//! Core trait and error type for text extraction backends.

use async_trait::async_trait;

use super::DocumentKind;

/// Errors that can occur while extracting text from an upload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractionError {
    /// The upload contained no text at all.
    #[error("File is empty")]
    Empty,

    /// Some text came out, but not enough to analyze.
    #[error("{kind} extraction failed: could not extract sufficient text ({chars} characters, minimum {min})")]
    InsufficientText {
        kind: DocumentKind,
        chars: usize,
        min: usize,
    },

    /// The backend could not read the file (corrupt, encrypted, ...).
    #[error("{kind} extraction failed: {reason}")]
    Unreadable { kind: DocumentKind, reason: String },

    /// The backend does not handle this kind of document.
    #[error("Unsupported file type for this extractor: {0}")]
    Unsupported(DocumentKind),

    /// The blocking extraction task was cancelled or panicked.
    #[error("Extraction task failed: {0}")]
    Join(String),
}

/// Trait for text extraction backends.
///
/// Implementors turn raw upload bytes of a given [`DocumentKind`] into plain
/// text. Length checks are applied by the caller, not the backend.
#[async_trait]
pub trait TextExtractor: Send + Sync + std::fmt::Debug {
    /// Extract plain text from `data`.
    ///
    /// `declared_mime` is the client-declared content type, if any.
    async fn extract(
        &self,
        data: &[u8],
        kind: DocumentKind,
        declared_mime: Option<&str>,
    ) -> Result<String, ExtractionError>;

    /// Whether this backend handles `kind`.
    fn supports(&self, kind: DocumentKind) -> bool;

    /// Backend name for logging.
    fn provider_name(&self) -> &'static str;
}
