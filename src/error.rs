//! Errors surfaced to users of an analysis run.
//!
//! Each stage has its own typed error; [`IntakeError`] unifies them at the
//! orchestration point and maps each to a stable code and a message a
//! non-lawyer can act on.

use crate::analysis::AnalysisError;
use crate::intake::{AdmissionError, DocumentKind, ExtractionError};

const INSUFFICIENT_TEXT: &str =
    "Could not extract sufficient text from document. Please ensure the document contains readable text.";

const CREDENTIALS_TIP: &str = "Tip: Make sure your Google API key is valid, has access to Gemini models, and has remaining quota.";

/// Failure of any stage of an upload-analyze cycle.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IntakeError {
    /// Rejected before extraction (size, type).
    #[error(transparent)]
    Admission(#[from] AdmissionError),

    /// Text could not be extracted.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// Every model endpoint failed, or the text was unusable.
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

impl IntakeError {
    /// Stable machine-readable code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Admission(AdmissionError::TooLarge { .. }) => "FILE_TOO_LARGE",
            Self::Admission(AdmissionError::Unsupported { .. }) => "UNSUPPORTED_TYPE",
            Self::Extraction(_) => "EXTRACTION_FAILED",
            Self::Analysis(AnalysisError::TextTooShort { .. }) => "INSUFFICIENT_TEXT",
            Self::Analysis(AnalysisError::NoEndpoints) => "ANALYSIS_NOT_CONFIGURED",
            Self::Analysis(AnalysisError::Exhausted { .. }) => "ANALYSIS_FAILED",
        }
    }

    /// Message suitable for display to the end user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Admission(err) => err.to_string(),
            Self::Extraction(err) => extraction_message(err),
            Self::Analysis(AnalysisError::TextTooShort { .. }) => INSUFFICIENT_TEXT.to_string(),
            Self::Analysis(AnalysisError::NoEndpoints) => {
                "Document analysis is not configured: no model endpoints are available.".to_string()
            }
            Self::Analysis(err @ AnalysisError::Exhausted { .. }) => {
                format!("{err}\n\n{CREDENTIALS_TIP}")
            }
        }
    }
}

fn extraction_message(err: &ExtractionError) -> String {
    match err {
        ExtractionError::Empty => "File is empty".to_string(),
        ExtractionError::InsufficientText { kind, .. } => match kind {
            DocumentKind::Pdf => {
                "Could not extract sufficient text from PDF. The PDF might be scanned or image-based."
                    .to_string()
            }
            DocumentKind::Image => "Could not extract sufficient text from image. Please ensure the image is clear and contains readable text.".to_string(),
            DocumentKind::Word | DocumentKind::PlainText => INSUFFICIENT_TEXT.to_string(),
        },
        ExtractionError::Unreadable { kind, .. } => unreadable_message(*kind).to_string(),
        ExtractionError::Unsupported(_) => {
            "Unsupported file type. Please use TXT, PDF, DOCX, or Image files.".to_string()
        }
        ExtractionError::Join(_) => "Failed to extract text. Please try again.".to_string(),
    }
}

fn unreadable_message(kind: DocumentKind) -> &'static str {
    match kind {
        DocumentKind::Pdf | DocumentKind::PlainText => {
            "Could not read the document. The file might be corrupted or password-protected."
        }
        DocumentKind::Image => {
            "Could not read text from image. Please ensure the image is clear and contains readable text."
        }
        DocumentKind::Word => {
            "Could not read Word document. Please try saving it in a newer format or as PDF."
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admission_message_passes_through() {
        let err = IntakeError::from(AdmissionError::TooLarge {
            size_mb: 20.0,
            max_mb: 16,
        });
        assert_eq!(err.code(), "FILE_TOO_LARGE");
        assert_eq!(
            err.user_message(),
            "File size (20.00MB) exceeds maximum allowed size (16MB)"
        );
    }

    #[test]
    fn test_extraction_messages_are_format_specific() {
        let pdf = IntakeError::from(ExtractionError::Unreadable {
            kind: DocumentKind::Pdf,
            reason: "encrypted".to_string(),
        });
        assert!(pdf.user_message().contains("password-protected"));

        let word = IntakeError::from(ExtractionError::Unreadable {
            kind: DocumentKind::Word,
            reason: "bad zip".to_string(),
        });
        assert!(word.user_message().contains("Word document"));

        let scan = IntakeError::from(ExtractionError::InsufficientText {
            kind: DocumentKind::Pdf,
            chars: 3,
            min: 50,
        });
        assert!(scan.user_message().contains("scanned"));
    }

    #[test]
    fn test_exhausted_includes_last_error_and_tip() {
        let err = IntakeError::from(AnalysisError::Exhausted {
            attempts: 3,
            last_error: "HTTP 429: Quota exceeded".to_string(),
        });
        let message = err.user_message();
        assert_eq!(err.code(), "ANALYSIS_FAILED");
        assert!(message.contains("HTTP 429: Quota exceeded"));
        assert!(message.contains("API key"));
    }
}
