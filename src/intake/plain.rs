//! Local plain-text extraction.
//!
//! Plain text needs no external library: the bytes are decoded as UTF-8,
//! with invalid sequences replaced, the way a browser text reader does.

use async_trait::async_trait;

use super::DocumentKind;
use super::provider::{ExtractionError, TextExtractor};

/// Extractor for `.txt` uploads.
#[derive(Debug, Default)]
pub struct PlainTextExtractor;

impl PlainTextExtractor {
    /// Create a new plain-text extractor.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextExtractor for PlainTextExtractor {
    async fn extract(
        &self,
        data: &[u8],
        kind: DocumentKind,
        _declared_mime: Option<&str>,
    ) -> Result<String, ExtractionError> {
        if !self.supports(kind) {
            return Err(ExtractionError::Unsupported(kind));
        }

        let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
        let text = String::from_utf8_lossy(data).into_owned();
        if text.trim().is_empty() {
            return Err(ExtractionError::Empty);
        }
        Ok(text)
    }

    fn supports(&self, kind: DocumentKind) -> bool {
        kind == DocumentKind::PlainText
    }

    fn provider_name(&self) -> &'static str {
        "Plain text"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_decode_utf8() {
        let extractor = PlainTextExtractor::new();
        let text = extractor
            .extract("Lease ₹12,000 · Chennai".as_bytes(), DocumentKind::PlainText, None)
            .await
            .unwrap();
        assert_eq!(text, "Lease ₹12,000 · Chennai");
    }

    #[tokio::test]
    async fn test_strips_bom_and_replaces_invalid_bytes() {
        let extractor = PlainTextExtractor::new();
        let text = extractor
            .extract(b"\xEF\xBB\xBFabc\xFFdef", DocumentKind::PlainText, None)
            .await
            .unwrap();
        assert_eq!(text, "abc\u{FFFD}def");
    }

    #[tokio::test]
    async fn test_whitespace_only_is_empty() {
        let extractor = PlainTextExtractor::new();
        let err = extractor
            .extract(b" \n\t ", DocumentKind::PlainText, None)
            .await
            .unwrap_err();
        assert_eq!(err, ExtractionError::Empty);
    }

    #[tokio::test]
    async fn test_rejects_other_kinds() {
        let extractor = PlainTextExtractor::new();
        let err = extractor
            .extract(b"%PDF-1.7", DocumentKind::Pdf, None)
            .await
            .unwrap_err();
        assert_eq!(err, ExtractionError::Unsupported(DocumentKind::Pdf));
    }
}
