//! Prompt construction for document analysis.

use crate::language::Language;

/// Maximum number of characters of document text sent to a model.
pub const MAX_INPUT_CHARS: usize = 10_000;

/// Appended to document text that was cut at [`MAX_INPUT_CHARS`].
pub const TRUNCATION_MARKER: &str = "\n\n[Document truncated for analysis]";

const SYSTEM_PREAMBLE: &str = "You are an expert legal document analyzer helping rural Indian citizens understand complex legal documents.

ANALYZE THIS SPECIFIC DOCUMENT - DO NOT GIVE GENERIC RESPONSES!

Extract ACTUAL information from the document text below:
- Real party names
- Specific amounts (money, penalties)
- Exact time periods
- Actual clauses and terms

Respond ONLY with valid JSON. No markdown, no code blocks, no extra text.";

/// A fully built analysis prompt.
///
/// Built once per pipeline run and shared by every endpoint attempt, so all
/// models see byte-identical input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisPrompt {
    system: String,
    task: String,
    document: String,
    truncated: bool,
}

impl AnalysisPrompt {
    /// Build a prompt, cutting the document at `max_chars`.
    #[must_use]
    pub fn build(text: &str, language: Language, max_chars: usize) -> Self {
        let (document, truncated) = truncate(text, max_chars);
        let task = task_body(&document, language);
        Self {
            system: SYSTEM_PREAMBLE.to_string(),
            task,
            document,
            truncated,
        }
    }

    /// Role framing sent as the first part.
    pub fn system(&self) -> &str {
        &self.system
    }

    /// Task body (language, document, output schema) sent as the second part.
    pub fn task(&self) -> &str {
        &self.task
    }

    /// The document text as submitted, including any truncation marker.
    pub fn document(&self) -> &str {
        &self.document
    }

    /// Whether the document was cut to fit.
    pub fn truncated(&self) -> bool {
        self.truncated
    }
}

/// Cut `text` to `max_chars` characters, appending [`TRUNCATION_MARKER`] when cut.
#[must_use]
pub fn truncate(text: &str, max_chars: usize) -> (String, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => {
            let mut out = String::with_capacity(byte_idx + TRUNCATION_MARKER.len());
            out.push_str(&text[..byte_idx]);
            out.push_str(TRUNCATION_MARKER);
            (out, true)
        }
        None => (text.to_string(), false),
    }
}

fn task_body(document: &str, language: Language) -> String {
    let lang = language.name();
    format!(
        r#"Document Language: {lang}

Document Text:
{document}

Return this JSON structure with SPECIFIC information from the document:

{{
  "documentType": "Specific type (e.g., 'Cost Plus Construction Contract between Hoku Materials and XYZ')",
  "simpleSummary": "2-3 sentences in {lang} about THIS document. Mention specific parties, amounts, dates, terms from the text.",
  "keyTerms": [
    {{"term": "Actual term from document", "explanation": "Simple explanation in {lang}"}},
    {{"term": "Another actual term", "explanation": "Explanation in {lang}"}},
    {{"term": "Third term", "explanation": "Explanation in {lang}"}},
    {{"term": "Fourth term", "explanation": "Explanation in {lang}"}}
  ],
  "riskyClausesList": [
    {{"clause": "SPECIFIC risky clause from THIS document", "risk": "Why risky in {lang}"}},
    {{"clause": "Another SPECIFIC risky clause", "risk": "Risk in {lang}"}}
  ],
  "riskLevel": "LOW or MEDIUM or HIGH or CRITICAL",
  "recommendations": [
    "Specific recommendation for THIS document in {lang}",
    "Another recommendation in {lang}",
    "Third recommendation in {lang}"
  ]
}}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_untouched() {
        let (out, truncated) = truncate("short document", MAX_INPUT_CHARS);
        assert_eq!(out, "short document");
        assert!(!truncated);
    }

    #[test]
    fn test_exact_limit_untouched() {
        let text = "a".repeat(MAX_INPUT_CHARS);
        let (out, truncated) = truncate(&text, MAX_INPUT_CHARS);
        assert_eq!(out.len(), MAX_INPUT_CHARS);
        assert!(!truncated);
    }

    #[test]
    fn test_long_text_truncated_with_marker() {
        let text = format!("{}{}", "x".repeat(MAX_INPUT_CHARS), "TAIL");
        let (out, truncated) = truncate(&text, MAX_INPUT_CHARS);
        assert!(truncated);
        assert_eq!(out, format!("{}{TRUNCATION_MARKER}", "x".repeat(MAX_INPUT_CHARS)));
        assert!(!out.contains("TAIL"));
    }

    #[test]
    fn test_truncation_counts_characters_not_bytes() {
        // Each Tamil letter here is 3 bytes in UTF-8.
        let text = "க".repeat(12);
        let (out, truncated) = truncate(&text, 10);
        assert!(truncated);
        assert_eq!(out, format!("{}{TRUNCATION_MARKER}", "க".repeat(10)));
    }

    #[test]
    fn test_prompt_embeds_language_and_document() {
        let prompt = AnalysisPrompt::build("Lease between A and B", Language::Tamil, MAX_INPUT_CHARS);
        assert!(prompt.task().starts_with("Document Language: Tamil"));
        assert!(prompt.task().contains("Lease between A and B"));
        assert!(prompt.task().contains("\"riskyClausesList\""));
        assert!(prompt.task().contains("Simple explanation in Tamil"));
        assert!(prompt.system().contains("DO NOT GIVE GENERIC RESPONSES"));
        assert_eq!(prompt.document(), "Lease between A and B");
    }
}
