//! Validation and repair of model completions.
//!
//! Models are asked for bare JSON but regularly wrap it in prose or code
//! fences, drop fields, or answer with a generic template. This module
//! isolates the JSON object, rejects generic answers, and fills missing
//! list fields with fixed placeholders.

use serde_json::Value;

use super::{AnalysisResult, EndpointError, KeyTerm, RiskLevel, RiskyClause};

/// A `documentType` shorter than this is treated as a generic answer.
pub const MIN_DOCUMENT_TYPE_CHARS: usize = 5;

/// Placeholder for a missing `keyTerms` list: `(term, explanation)`.
pub const PLACEHOLDER_KEY_TERM: (&str, &str) = ("Review Required", "Please review document");

/// Placeholder for a missing `riskyClausesList`: `(clause, risk)`.
pub const PLACEHOLDER_RISKY_CLAUSE: (&str, &str) = ("Full review needed", "Seek legal advice");

/// Placeholders for a missing `recommendations` list.
pub const PLACEHOLDER_RECOMMENDATIONS: [&str; 2] = ["Consult a lawyer", "Read carefully"];

/// A parsed but not yet validated analysis.
///
/// Every field is optional: list fields that are missing, not arrays, or
/// empty are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialAnalysis {
    pub document_type: Option<String>,
    pub simple_summary: Option<String>,
    pub key_terms: Option<Vec<KeyTerm>>,
    pub risky_clauses_list: Option<Vec<RiskyClause>>,
    pub risk_level: Option<RiskLevel>,
    pub recommendations: Option<Vec<String>>,
}

impl PartialAnalysis {
    /// Read fields leniently from a JSON object.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        Self {
            document_type: value
                .get("documentType")
                .and_then(Value::as_str)
                .map(ToString::to_string),
            simple_summary: value
                .get("simpleSummary")
                .and_then(Value::as_str)
                .map(ToString::to_string),
            key_terms: list_field(value, "keyTerms", |v| {
                let (term, explanation) = pair_of(v, "term", "explanation");
                KeyTerm { term, explanation }
            }),
            risky_clauses_list: list_field(value, "riskyClausesList", |v| {
                let (clause, risk) = pair_of(v, "clause", "risk");
                RiskyClause { clause, risk }
            }),
            risk_level: value
                .get("riskLevel")
                .and_then(Value::as_str)
                .and_then(RiskLevel::parse),
            recommendations: list_field(value, "recommendations", text_of),
        }
    }
}

/// `None` only when the field is missing, not an array, or empty. Every
/// element of a non-empty array is kept.
fn list_field<T>(value: &Value, key: &str, item: impl Fn(&Value) -> T) -> Option<Vec<T>> {
    let items = value.get(key)?.as_array()?;
    (!items.is_empty()).then(|| items.iter().map(item).collect())
}

/// Null reads as empty; numbers, booleans and nested values are stringified.
fn text_of(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Read two named fields of a list item. A bare value becomes the first field.
fn pair_of(item: &Value, first: &str, second: &str) -> (String, String) {
    match item {
        Value::Object(fields) => (
            fields.get(first).map(text_of).unwrap_or_default(),
            fields.get(second).map(text_of).unwrap_or_default(),
        ),
        other => (text_of(other), String::new()),
    }
}

/// Fill missing fields with placeholders.
///
/// Populated fields are passed through untouched. A missing risk level
/// becomes [`RiskLevel::Medium`]; a missing summary becomes empty.
#[must_use]
pub fn repair(partial: PartialAnalysis) -> AnalysisResult {
    AnalysisResult {
        document_type: partial.document_type.unwrap_or_default(),
        simple_summary: partial.simple_summary.unwrap_or_default(),
        key_terms: partial.key_terms.unwrap_or_else(|| {
            vec![KeyTerm {
                term: PLACEHOLDER_KEY_TERM.0.to_string(),
                explanation: PLACEHOLDER_KEY_TERM.1.to_string(),
            }]
        }),
        risky_clauses_list: partial.risky_clauses_list.unwrap_or_else(|| {
            vec![RiskyClause {
                clause: PLACEHOLDER_RISKY_CLAUSE.0.to_string(),
                risk: PLACEHOLDER_RISKY_CLAUSE.1.to_string(),
            }]
        }),
        risk_level: partial.risk_level.unwrap_or_default(),
        recommendations: partial.recommendations.unwrap_or_else(|| {
            PLACEHOLDER_RECOMMENDATIONS
                .iter()
                .map(ToString::to_string)
                .collect()
        }),
    }
}

/// Strip code-fence artifacts and cut the completion down to its outermost
/// `{ ... }` span.
pub fn isolate_json(raw: &str) -> Result<String, EndpointError> {
    let cleaned = raw.replace("```json", "").replace('`', "");
    let cleaned = cleaned.trim();

    let start = cleaned.find('{').ok_or(EndpointError::NoJson)?;
    let end = cleaned.rfind('}').ok_or(EndpointError::NoJson)?;
    if end < start {
        return Err(EndpointError::NoJson);
    }
    Ok(cleaned[start..=end].to_string())
}

/// Turn a raw completion into a validated, repaired result.
pub fn interpret_completion(raw: &str) -> Result<AnalysisResult, EndpointError> {
    let candidate = isolate_json(raw)?;
    let value: Value = serde_json::from_str(&candidate)
        .map_err(|e| EndpointError::InvalidJson(e.to_string()))?;

    let partial = PartialAnalysis::from_value(&value);
    match &partial.document_type {
        Some(doc_type) if doc_type.chars().count() >= MIN_DOCUMENT_TYPE_CHARS => {}
        other => return Err(EndpointError::Generic(other.clone().unwrap_or_default())),
    }

    Ok(repair(partial))
}
