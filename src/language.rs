//! Document language identification.
//!
//! Documents are classified into a small fixed set of supported languages.
//! Anything the detector cannot place (too short, mixed, or a language
//! outside the set) falls back to [`Language::English`].

use std::fmt;
use std::sync::LazyLock;

use lingua::{LanguageDetector, LanguageDetectorBuilder};
use serde::{Deserialize, Serialize};

/// Texts shorter than this many characters are not worth classifying.
const MIN_DETECTION_CHARS: usize = 10;

static DETECTOR: LazyLock<LanguageDetector> = LazyLock::new(|| {
    LanguageDetectorBuilder::from_languages(&[
        lingua::Language::English,
        lingua::Language::Tamil,
        lingua::Language::Hindi,
    ])
    .build()
});

/// A supported document language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    /// English (`en-IN`).
    #[default]
    English,
    /// Tamil (`ta-IN`).
    Tamil,
    /// Hindi (`hi-IN`).
    Hindi,
}

impl Language {
    /// All supported languages, default first.
    pub const ALL: [Self; 3] = [Self::English, Self::Tamil, Self::Hindi];

    /// Detect the language of `text`.
    #[must_use]
    pub fn detect(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.chars().count() < MIN_DETECTION_CHARS {
            return Self::default();
        }

        match DETECTOR.detect_language_of(trimmed) {
            Some(lingua::Language::Tamil) => Self::Tamil,
            Some(lingua::Language::Hindi) => Self::Hindi,
            _ => Self::English,
        }
    }

    /// Resolve a user-supplied label.
    ///
    /// Accepts canonical names (`"Tamil"`), ISO 639 codes (`"ta"`, `"tam"`)
    /// and locale tags (`"ta-IN"`), case-insensitively. Unknown labels map to
    /// the default language.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        let lower = label.trim().to_lowercase();
        let primary = lower.split(['-', '_']).next().unwrap_or_default();
        match primary {
            "tamil" | "ta" | "tam" => Self::Tamil,
            "hindi" | "hi" | "hin" => Self::Hindi,
            _ => Self::English,
        }
    }

    /// Canonical English name, used in prompts and API responses.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Tamil => "Tamil",
            Self::Hindi => "Hindi",
        }
    }

    /// BCP 47 locale tag used for speech synthesis.
    #[must_use]
    pub fn locale(self) -> &'static str {
        match self {
            Self::English => "en-IN",
            Self::Tamil => "ta-IN",
            Self::Hindi => "hi-IN",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_english() {
        let text = "This rental agreement is made between the landlord and the tenant \
                    for the residential property located in Chennai.";
        assert_eq!(Language::detect(text), Language::English);
    }

    #[test]
    fn test_detect_tamil() {
        let text = "இந்த வாடகை ஒப்பந்தம் வீட்டு உரிமையாளருக்கும் வாடகைதாரருக்கும் இடையே செய்யப்பட்டது";
        assert_eq!(Language::detect(text), Language::Tamil);
    }

    #[test]
    fn test_detect_hindi() {
        let text = "यह किराया समझौता मकान मालिक और किरायेदार के बीच किया गया है और इसकी अवधि ग्यारह महीने है";
        assert_eq!(Language::detect(text), Language::Hindi);
    }

    #[test]
    fn test_short_text_defaults_to_english() {
        assert_eq!(Language::detect("नमस्ते"), Language::English);
        assert_eq!(Language::detect("   "), Language::English);
    }

    #[test]
    fn test_from_label() {
        assert_eq!(Language::from_label("Tamil"), Language::Tamil);
        assert_eq!(Language::from_label("hi-IN"), Language::Hindi);
        assert_eq!(Language::from_label("TAM"), Language::Tamil);
        assert_eq!(Language::from_label("French"), Language::English);
        assert_eq!(Language::from_label(""), Language::English);
    }

    #[test]
    fn test_locale_tags() {
        assert_eq!(Language::English.locale(), "en-IN");
        assert_eq!(Language::Tamil.locale(), "ta-IN");
        assert_eq!(Language::Hindi.locale(), "hi-IN");
        assert_eq!(Language::Hindi.to_string(), "Hindi");
    }
}
