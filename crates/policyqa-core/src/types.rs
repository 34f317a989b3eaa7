//! Domain types shared by retrieval, answering and benchmarking.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type PassageId = String;
pub type Meta = HashMap<String, String>;

/// The fixed sentence returned whenever no supporting context exists.
pub const REFUSAL: &str = "Not specified in the provided context.";

/// Metadata keys consulted, in order, when a stored record has no text.
pub const METADATA_TEXT_KEYS: [&str; 5] = ["text", "content", "page_content", "chunk", "raw"];

/// A record owned by the external index. Never mutated by this workspace.
///
/// - `id`: opaque identifier, stable across queries
/// - `text`: passage body (may be empty when the store keeps it in metadata)
/// - `embedding`: fixed-length vector, same dimension for every record
/// - `metadata`: free-form string attributes
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IndexedPassage {
    pub id: PassageId,
    pub text: String,
    pub embedding: Vec<f32>,
    pub metadata: Meta,
}

impl IndexedPassage {
    /// Text used for diagnostics: the record text, else the first non-empty
    /// well-known metadata field.
    pub fn display_text(&self) -> &str {
        if !self.text.is_empty() {
            return &self.text;
        }
        METADATA_TEXT_KEYS
            .iter()
            .find_map(|k| self.metadata.get(*k).filter(|v| !v.is_empty()))
            .map_or("", String::as_str)
    }
}

/// One ranked passage for a query.
///
/// `distance` is `None` for exact substring matches and a cosine distance in
/// `[0, 2]` for semantic matches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievalResult {
    pub id: PassageId,
    pub text: String,
    pub distance: Option<f32>,
}

impl RetrievalResult {
    pub fn exact(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into(), distance: None }
    }

    pub fn semantic(id: impl Into<String>, text: impl Into<String>, distance: f32) -> Self {
        Self { id: id.into(), text: text.into(), distance: Some(distance) }
    }

    pub fn is_exact(&self) -> bool {
        self.distance.is_none()
    }

    /// Display-only similarity, `1 - distance`; exact matches report 1.0.
    pub fn similarity(&self) -> f32 {
        self.distance.map_or(1.0, |d| 1.0 - d)
    }
}

/// Final answer for one question.
///
/// When retrieval finds nothing, `citation_ids` is empty and `text` is the
/// refusal sentence; use [`GroundedAnswer::refusal`] for that case. A failed
/// retrieval also has no citations but carries the error text instead.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroundedAnswer {
    pub text: String,
    pub citation_ids: Vec<PassageId>,
}

impl GroundedAnswer {
    pub fn refusal() -> Self {
        Self { text: REFUSAL.to_string(), citation_ids: Vec::new() }
    }

    /// Builds an answer, collapsing to the refusal when no citations back it.
    pub fn cited(text: impl Into<String>, citation_ids: Vec<PassageId>) -> Self {
        if citation_ids.is_empty() {
            return Self::refusal();
        }
        Self { text: text.into(), citation_ids }
    }

    pub fn is_refusal(&self) -> bool {
        self.text == REFUSAL
    }
}

/// One row of the benchmark report. Field names map to the CSV header.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BenchmarkRecord {
    pub model: String,
    pub question: String,
    #[serde(rename = "latency_s")]
    pub latency_seconds: f64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
    pub answer_preview: String,
}

impl BenchmarkRecord {
    /// Zero-valued record for a failed call.
    pub fn failed(model: &str, question: &str, cause: &str) -> Self {
        Self {
            model: model.to_string(),
            question: question.to_string(),
            latency_seconds: 0.0,
            input_tokens: 0,
            output_tokens: 0,
            total_tokens: 0,
            answer_preview: preview(&format!("ERROR: {cause}"), ANSWER_PREVIEW_CHARS),
        }
    }
}

pub const ANSWER_PREVIEW_CHARS: usize = 200;

/// First `max_chars` characters of `text` with newlines replaced by spaces.
pub fn preview(text: &str, max_chars: usize) -> String {
    text.chars()
        .take(max_chars)
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect()
}

/// A file of the static benchmark corpus after text extraction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CorpusDocument {
    pub filename: String,
    pub extracted_text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cited_without_ids_is_refusal() {
        let a = GroundedAnswer::cited("made up", vec![]);
        assert!(a.is_refusal());
        assert!(a.citation_ids.is_empty());
    }

    #[test]
    fn display_text_falls_back_to_metadata() {
        let mut p = IndexedPassage { id: "x".into(), ..Default::default() };
        p.metadata.insert("page_content".into(), "from meta".into());
        assert_eq!(p.display_text(), "from meta");
        p.metadata.insert("content".into(), "earlier key".into());
        assert_eq!(p.display_text(), "earlier key");
        p.text = "primary".into();
        assert_eq!(p.display_text(), "primary");
    }

    #[test]
    fn preview_truncates_and_flattens() {
        let long = format!("a\nb{}", "c".repeat(300));
        let p = preview(&long, 200);
        assert_eq!(p.chars().count(), 200);
        assert!(!p.contains('\n'));
        assert!(p.starts_with("a b"));
    }

    #[test]
    fn similarity_is_one_for_exact() {
        assert_eq!(RetrievalResult::exact("a", "t").similarity(), 1.0);
        let s = RetrievalResult::semantic("a", "t", 0.25);
        assert!((s.similarity() - 0.75).abs() < 1e-6);
    }
}
