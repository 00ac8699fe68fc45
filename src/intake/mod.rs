//! Document intake: upload admission and text extraction.
//!
//! This module turns an uploaded file into [`DocumentText`]. Uploads are
//! first admitted against size and type limits, then routed to an
//! extraction backend by [`DocumentKind`].
//!
//! # Backends
//!
//! - [`PlainTextExtractor`] - local UTF-8 decoding for `.txt`
//! - [`KreuzbergExtractor`] - PDF text layer, DOCX text, image OCR
//!
//! # Usage
//!
//! ```rust,ignore
//! use legal_lens::intake::Intake;
//!
//! let intake = Intake::new(AdmissionPolicy::default(), KreuzbergSettings::default());
//! let document = intake.process("lease.pdf", Some("application/pdf"), &bytes).await?;
//! println!("{} words", document.word_count());
//! ```

mod admission;
mod kreuzberg;
mod plain;
mod provider;

pub use admission::{AdmissionError, AdmissionPolicy, DEFAULT_MAX_UPLOAD_MB, DocumentKind};
pub use kreuzberg::{KreuzbergExtractor, KreuzbergSettings};
pub use plain::PlainTextExtractor;
pub use provider::{ExtractionError, TextExtractor};

use std::sync::Arc;

use crate::error::IntakeError;

/// Extracted text shorter than this (after trimming) is rejected.
pub const MIN_TEXT_CHARS: usize = 50;

/// Plain text extracted from one upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentText {
    file_name: String,
    kind: DocumentKind,
    text: String,
}

impl DocumentText {
    /// Wrap already-extracted text.
    pub fn new(file_name: impl Into<String>, kind: DocumentKind, text: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            kind,
            text: text.into(),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    /// Extracted text, trimmed.
    pub fn text(&self) -> &str {
        self.text.trim()
    }

    /// Number of characters in the trimmed text.
    pub fn char_count(&self) -> usize {
        self.text().chars().count()
    }

    /// Whitespace-separated word count.
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// Routes each [`DocumentKind`] to the backend that handles it.
#[derive(Debug, Clone)]
pub struct DocumentExtractor {
    backends: Vec<Arc<dyn TextExtractor>>,
    min_chars: usize,
}

impl DocumentExtractor {
    /// Build the standard backend set.
    pub fn new(settings: KreuzbergSettings) -> Self {
        Self::with_backends(vec![
            Arc::new(PlainTextExtractor::new()),
            Arc::new(KreuzbergExtractor::new(settings)),
        ])
    }

    /// Build from an explicit, ordered list of backends.
    pub fn with_backends(backends: Vec<Arc<dyn TextExtractor>>) -> Self {
        Self {
            backends,
            min_chars: MIN_TEXT_CHARS,
        }
    }

    /// Override the minimum extracted length.
    #[must_use]
    pub fn with_min_chars(mut self, min_chars: usize) -> Self {
        self.min_chars = min_chars;
        self
    }

    /// Extract text with the first backend that supports `kind`.
    pub async fn extract(
        &self,
        data: &[u8],
        kind: DocumentKind,
        declared_mime: Option<&str>,
    ) -> Result<String, ExtractionError> {
        let backend = self
            .backends
            .iter()
            .find(|b| b.supports(kind))
            .ok_or(ExtractionError::Unsupported(kind))?;

        tracing::debug!(
            name: "intake.extract.started",
            backend = backend.provider_name(),
            kind = %kind,
            bytes = data.len(),
            "Extracting document text"
        );

        let text = backend.extract(data, kind, declared_mime).await?;
        let chars = text.trim().chars().count();
        if chars == 0 {
            return Err(ExtractionError::Empty);
        }
        if chars < self.min_chars {
            return Err(ExtractionError::InsufficientText {
                kind,
                chars,
                min: self.min_chars,
            });
        }
        Ok(text)
    }
}

/// Admission plus extraction, the first two steps of every analysis.
#[derive(Debug, Clone)]
pub struct Intake {
    policy: AdmissionPolicy,
    extractor: DocumentExtractor,
}

impl Intake {
    /// Create an intake with the standard extraction backends.
    pub fn new(policy: AdmissionPolicy, settings: KreuzbergSettings) -> Self {
        Self::with_extractor(policy, DocumentExtractor::new(settings))
    }

    /// Create an intake around a custom extractor.
    pub fn with_extractor(policy: AdmissionPolicy, extractor: DocumentExtractor) -> Self {
        Self { policy, extractor }
    }

    pub fn policy(&self) -> &AdmissionPolicy {
        &self.policy
    }

    /// Admit and extract an uploaded file.
    pub async fn process(
        &self,
        file_name: &str,
        declared_mime: Option<&str>,
        data: &[u8],
    ) -> Result<DocumentText, IntakeError> {
        let kind = self
            .policy
            .admit(file_name, declared_mime, data.len() as u64)?;

        let text = self.extractor.extract(data, kind, declared_mime).await?;
        let document = DocumentText::new(file_name, kind, text);

        tracing::info!(
            name: "intake.extract.completed",
            file = %document.file_name(),
            kind = %kind,
            chars = document.char_count(),
            words = document.word_count(),
            "Document text extracted"
        );
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Returns canned text for image uploads.
    #[derive(Debug)]
    struct CannedOcr(&'static str);

    #[async_trait::async_trait]
    impl TextExtractor for CannedOcr {
        async fn extract(
            &self,
            _data: &[u8],
            _kind: DocumentKind,
            _declared_mime: Option<&str>,
        ) -> Result<String, ExtractionError> {
            Ok(self.0.to_string())
        }

        fn supports(&self, kind: DocumentKind) -> bool {
            kind == DocumentKind::Image
        }

        fn provider_name(&self) -> &'static str {
            "Canned"
        }
    }

    fn intake_with_ocr(text: &'static str) -> Intake {
        Intake::with_extractor(
            AdmissionPolicy::default(),
            DocumentExtractor::with_backends(vec![
                Arc::new(PlainTextExtractor::new()),
                Arc::new(CannedOcr(text)),
            ]),
        )
    }

    const LEASE: &str = "This lease is made on 1 March 2024 between Meena Iyer (Landlord) \
                         and Arjun Rao (Tenant) for a monthly rent of Rs. 18,000.";

    #[tokio::test]
    async fn test_process_text_upload() {
        let intake = intake_with_ocr("");
        let doc = intake
            .process("lease.txt", Some("text/plain"), LEASE.as_bytes())
            .await
            .unwrap();
        assert_eq!(doc.kind(), DocumentKind::PlainText);
        assert_eq!(doc.text(), LEASE);
        assert_eq!(doc.word_count(), 23);
    }

    #[tokio::test]
    async fn test_short_text_rejected() {
        let intake = intake_with_ocr("");
        let err = intake
            .process("note.txt", None, b"Pay Rs. 500")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            IntakeError::Extraction(ExtractionError::InsufficientText { chars: 11, .. })
        ));
    }

    #[tokio::test]
    async fn test_image_routed_to_ocr_backend() {
        let intake = intake_with_ocr(LEASE);
        let doc = intake
            .process("scan.png", Some("image/png"), b"\x89PNG")
            .await
            .unwrap();
        assert_eq!(doc.kind(), DocumentKind::Image);
        assert_eq!(doc.text(), LEASE);
    }

    #[tokio::test]
    async fn test_missing_backend_is_unsupported() {
        let intake = intake_with_ocr(LEASE);
        let err = intake
            .process("deed.pdf", Some("application/pdf"), b"%PDF")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            IntakeError::Extraction(ExtractionError::Unsupported(DocumentKind::Pdf))
        ));
    }

    #[tokio::test]
    async fn test_admission_runs_before_extraction() {
        let intake = intake_with_ocr(LEASE);
        let err = intake
            .process("macro.xlsm", Some("application/octet-stream"), LEASE.as_bytes())
            .await
            .unwrap_err();
        assert!(matches!(err, IntakeError::Admission(_)));
    }
}
