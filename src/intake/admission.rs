//! Upload admission: size and type checks before any extraction work.

use std::fmt;
use std::path::Path;

use serde::Serialize;

/// Default maximum upload size in megabytes.
pub const DEFAULT_MAX_UPLOAD_MB: u64 = 16;

const BYTES_PER_MB: u64 = 1024 * 1024;

const WORD_DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
const WORD_DOC_MIME: &str = "application/msword";

/// Accepted declared MIME types.
const ALLOWED_MIME_TYPES: &[&str] = &[
    "text/plain",
    "application/pdf",
    WORD_DOCX_MIME,
    WORD_DOC_MIME,
    "image/png",
    "image/jpeg",
    "image/jpg",
];

/// Accepted file extensions (lowercase, with dot).
const ALLOWED_EXTENSIONS: &[&str] = &[".txt", ".pdf", ".docx", ".doc", ".png", ".jpg", ".jpeg"];

/// Broad document format, used to route extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// Plain text, decoded locally.
    PlainText,
    /// PDF with a text layer.
    Pdf,
    /// Word `.docx` (and legacy `.doc`, best effort).
    Word,
    /// PNG or JPEG image, read with OCR.
    Image,
}

impl DocumentKind {
    /// Short tag used in error messages.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::PlainText => "TXT",
            Self::Pdf => "PDF",
            Self::Word => "DOCX",
            Self::Image => "Image OCR",
        }
    }

    /// MIME type handed to the extraction backend.
    #[must_use]
    pub fn extraction_mime(self, declared: Option<&str>) -> &str {
        match (self, declared) {
            (Self::PlainText, _) => "text/plain",
            (Self::Pdf, _) => "application/pdf",
            (Self::Word, Some(WORD_DOC_MIME)) => WORD_DOC_MIME,
            (Self::Word, _) => WORD_DOCX_MIME,
            (Self::Image, Some(mime)) if mime.starts_with("image/") => mime,
            (Self::Image, _) => "image/png",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Rejection of an upload before extraction.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AdmissionError {
    #[error("File size ({size_mb:.2}MB) exceeds maximum allowed size ({max_mb}MB)")]
    TooLarge { size_mb: f64, max_mb: u64 },

    #[error("Unsupported file type. Please use TXT, PDF, DOCX, or Image files.")]
    Unsupported { file_name: String },
}

/// Size and type limits for uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionPolicy {
    pub max_upload_mb: u64,
}

impl Default for AdmissionPolicy {
    fn default() -> Self {
        Self {
            max_upload_mb: DEFAULT_MAX_UPLOAD_MB,
        }
    }
}

impl AdmissionPolicy {
    /// Maximum upload size in bytes.
    #[must_use]
    pub fn max_bytes(&self) -> u64 {
        self.max_upload_mb.saturating_mul(BYTES_PER_MB)
    }

    /// Admit an upload and classify it.
    ///
    /// The declared MIME type and the file extension are checked
    /// independently; either one being on the allow-list admits the file.
    pub fn admit(
        &self,
        file_name: &str,
        declared_mime: Option<&str>,
        size: u64,
    ) -> Result<DocumentKind, AdmissionError> {
        if size > self.max_bytes() {
            #[allow(clippy::cast_precision_loss)]
            let size_mb = size as f64 / BYTES_PER_MB as f64;
            return Err(AdmissionError::TooLarge {
                size_mb,
                max_mb: self.max_upload_mb,
            });
        }

        let mime = declared_mime.map(|m| m.trim().to_lowercase());
        let extension = extension_of(file_name);

        let mime_ok = mime
            .as_deref()
            .is_some_and(|m| ALLOWED_MIME_TYPES.contains(&m));
        let ext_ok = extension
            .as_deref()
            .is_some_and(|e| ALLOWED_EXTENSIONS.contains(&e));

        if !mime_ok && !ext_ok {
            return Err(AdmissionError::Unsupported {
                file_name: file_name.to_string(),
            });
        }

        classify(mime.as_deref(), extension.as_deref()).ok_or_else(|| AdmissionError::Unsupported {
            file_name: file_name.to_string(),
        })
    }
}

/// Lowercase extension including the leading dot.
fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
}

/// Route by declared type first, then by extension.
fn classify(mime: Option<&str>, extension: Option<&str>) -> Option<DocumentKind> {
    let guessed = extension.and_then(|ext| {
        mime_guess::from_ext(ext.trim_start_matches('.'))
            .first_raw()
            .map(str::to_string)
    });

    let by_mime = |m: &str| match m {
        "text/plain" => Some(DocumentKind::PlainText),
        "application/pdf" => Some(DocumentKind::Pdf),
        WORD_DOCX_MIME | WORD_DOC_MIME => Some(DocumentKind::Word),
        m if m.starts_with("image/") => Some(DocumentKind::Image),
        _ => None,
    };

    match extension {
        Some(".txt") => return Some(DocumentKind::PlainText),
        Some(".pdf") => return Some(DocumentKind::Pdf),
        Some(".docx" | ".doc") => return Some(DocumentKind::Word),
        _ => {}
    }

    mime.and_then(by_mime)
        .or_else(|| guessed.as_deref().and_then(by_mime))
}
