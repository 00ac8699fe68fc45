//! Kreuzberg-backed extraction for PDF, Word and image uploads.
//!
//! Uses the Kreuzberg Rust core: PDF text layers, DOCX text, and Tesseract
//! OCR for images. Extraction is CPU-bound and runs on the blocking pool.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::DocumentKind;
use super::provider::{ExtractionError, TextExtractor};

/// OCR settings for the Kreuzberg backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KreuzbergSettings {
    /// Run OCR on images (and image-only PDF pages).
    pub ocr_enabled: bool,
    /// OCR backend name understood by Kreuzberg.
    pub ocr_backend: String,
    /// Tesseract language string.
    pub ocr_language: String,
}

impl Default for KreuzbergSettings {
    fn default() -> Self {
        Self {
            ocr_enabled: true,
            ocr_backend: "tesseract".to_string(),
            ocr_language: "eng+hin+tam".to_string(),
        }
    }
}

/// Extractor for binary document formats.
#[derive(Debug, Clone, Default)]
pub struct KreuzbergExtractor {
    settings: KreuzbergSettings,
}

impl KreuzbergExtractor {
    /// Create an extractor with the given OCR settings.
    pub fn new(settings: KreuzbergSettings) -> Self {
        Self { settings }
    }

    fn build_extraction_config(&self) -> kreuzberg::ExtractionConfig {
        let mut config = kreuzberg::ExtractionConfig::default();

        if self.settings.ocr_enabled {
            config.ocr = Some(kreuzberg::OcrConfig {
                backend: self.settings.ocr_backend.clone(),
                language: self.settings.ocr_language.clone(),
                tesseract_config: None,
            });
        }

        config
    }
}

#[async_trait]
impl TextExtractor for KreuzbergExtractor {
    async fn extract(
        &self,
        data: &[u8],
        kind: DocumentKind,
        declared_mime: Option<&str>,
    ) -> Result<String, ExtractionError> {
        if !self.supports(kind) {
            return Err(ExtractionError::Unsupported(kind));
        }

        let extraction_config = self.build_extraction_config();
        let data_owned = data.to_vec();
        let mime = kind.extraction_mime(declared_mime).to_string();

        let result = tokio::task::spawn_blocking(move || {
            kreuzberg::extract_bytes_sync(&data_owned, &mime, &extraction_config)
        })
        .await
        .map_err(|e| ExtractionError::Join(e.to_string()))?
        .map_err(|e| ExtractionError::Unreadable {
            kind,
            reason: e.to_string(),
        })?;

        Ok(result.content)
    }

    fn supports(&self, kind: DocumentKind) -> bool {
        matches!(
            kind,
            DocumentKind::Pdf | DocumentKind::Word | DocumentKind::Image
        )
    }

    fn provider_name(&self) -> &'static str {
        "Kreuzberg"
    }
}
