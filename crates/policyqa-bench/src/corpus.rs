//! Static benchmark corpus: file enumeration, byte decoding, structured text
//! extraction and context assembly.

use anyhow::{Context, Result};
use regex::Regex;
use serde_json::Value;
use std::path::Path;
use walkdir::WalkDir;

use policyqa_core::config::ParseFallback;
use policyqa_core::types::CorpusDocument;

/// Generic document tree, independent of the on-disk format.
#[derive(Debug, Clone, PartialEq)]
pub enum DocNode {
    Text(String),
    /// Numbers, booleans, nulls: carry no extractable prose.
    Other,
    /// Key/value pairs in document order.
    Mapping(Vec<(String, DocNode)>),
    Sequence(Vec<DocNode>),
}

impl From<Value> for DocNode {
    fn from(v: Value) -> Self {
        match v {
            Value::String(s) => DocNode::Text(s),
            Value::Object(map) => DocNode::Mapping(map.into_iter().map(|(k, v)| (k, v.into())).collect()),
            Value::Array(items) => DocNode::Sequence(items.into_iter().map(Into::into).collect()),
            _ => DocNode::Other,
        }
    }
}

pub const KEY_HINTS: [&str; 17] = [
    "title", "section", "section_title", "content", "summary", "description",
    "responsibilities", "deliverables", "exit", "criteria", "activities",
    "objective", "scope", "review", "artifact", "output", "role",
];

/// Which strings of a document tree are worth keeping, and in what order.
#[derive(Debug, Clone)]
pub struct KeyPreference {
    hints: Vec<String>,
    noise: Regex,
    min_len: usize,
}

impl KeyPreference {
    pub fn new(hints: &[&str], noise_pattern: &str, min_len: usize) -> Result<Self> {
        Ok(Self {
            hints: hints.iter().map(|h| h.to_lowercase()).collect(),
            noise: Regex::new(noise_pattern).with_context(|| format!("bad noise pattern {noise_pattern:?}"))?,
            min_len,
        })
    }

    /// Policy-document defaults: hint keys above, field-code noise, strings over 20 chars.
    pub fn standard() -> Result<Self> {
        Self::new(&KEY_HINTS, r"(?i)(DOCPROPERTY|MERGEFORMAT)", 20)
    }

    pub fn is_preferred(&self, key: &str) -> bool {
        let key = key.to_lowercase();
        self.hints.iter().any(|h| key.contains(h.as_str()))
    }

    fn accept(&self, raw: &str) -> Option<String> {
        let t = raw.trim();
        (t.chars().count() > self.min_len && !self.noise.is_match(t)).then(|| t.to_string())
    }

    /// Kept strings of `node`, in visit order. Within a mapping: preferred
    /// strings, then the remaining strings, then nested containers. Bare
    /// strings inside sequences and at the root are not collected.
    pub fn extract(&self, node: &DocNode) -> Vec<String> {
        let mut out = Vec::new();
        self.visit(node, &mut out);
        out
    }

    fn visit(&self, node: &DocNode, out: &mut Vec<String>) {
        match node {
            DocNode::Mapping(entries) => {
                let strings = entries.iter().filter_map(|(k, v)| match v {
                    DocNode::Text(s) => Some((k, s)),
                    _ => None,
                });
                out.extend(strings.clone().filter(|(k, _)| self.is_preferred(k)).filter_map(|(_, s)| self.accept(s)));
                out.extend(strings.filter(|(k, _)| !self.is_preferred(k)).filter_map(|(_, s)| self.accept(s)));
                for (_, v) in entries {
                    if matches!(v, DocNode::Mapping(_) | DocNode::Sequence(_)) {
                        self.visit(v, out);
                    }
                }
            }
            DocNode::Sequence(items) => {
                for item in items {
                    self.visit(item, out);
                }
            }
            DocNode::Text(_) | DocNode::Other => {}
        }
    }
}

/// UTF-8, then UTF-16 when a BOM is present, then Latin-1 (never fails).
pub fn decode_bytes(bytes: &[u8]) -> String {
    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.strip_prefix('\u{feff}').unwrap_or(s).to_string();
    }
    let utf16 = match bytes {
        [0xFF, 0xFE, rest @ ..] => Some((rest, u16::from_le_bytes as fn([u8; 2]) -> u16)),
        [0xFE, 0xFF, rest @ ..] => Some((rest, u16::from_be_bytes as fn([u8; 2]) -> u16)),
        _ => None,
    };
    if let Some((rest, to_unit)) = utf16 {
        if rest.len() % 2 == 0 {
            let units: Vec<u16> = rest.chunks_exact(2).map(|c| to_unit([c[0], c[1]])).collect();
            if let Ok(s) = String::from_utf16(&units) {
                return s;
            }
        }
    }
    bytes.iter().map(|&b| char::from(b)).collect()
}

fn is_corpus_file(path: &Path) -> bool {
    matches!(path.extension().and_then(|e| e.to_str()), Some("json" | "txt" | "md"))
}

/// Text of one corpus file. `None` when a structured file fails to parse
/// under `ParseFallback::Skip`.
pub fn extract_document(path: &Path, bytes: &[u8], policy: &KeyPreference, fallback: ParseFallback) -> Option<String> {
    let raw = decode_bytes(bytes);
    if path.extension().and_then(|e| e.to_str()) != Some("json") {
        return Some(raw.trim().to_string());
    }
    match serde_json::from_str::<Value>(&raw) {
        Ok(v) => Some(policy.extract(&DocNode::from(v)).join("\n").trim().to_string()),
        Err(e) => {
            tracing::warn!(file = %path.display(), error = %e, ?fallback, "structured parse failed");
            match fallback {
                ParseFallback::RawText => Some(raw.trim().to_string()),
                ParseFallback::Skip => None,
            }
        }
    }
}

/// Regular files directly under `dir`, sorted by name, with their extracted text.
/// Files yielding no text are dropped.
pub fn load_corpus(dir: &Path, policy: &KeyPreference, fallback: ParseFallback) -> Result<Vec<CorpusDocument>> {
    let mut paths = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.with_context(|| format!("reading corpus dir {}", dir.display()))?;
        if entry.file_type().is_file() && is_corpus_file(entry.path()) {
            paths.push(entry.into_path());
        }
    }
    tracing::debug!(dir = %dir.display(), files = paths.len(), "corpus files found");

    Ok(paths.iter().filter_map(|p| read_document(p, policy, fallback)).collect())
}

/// One corpus file as a document. `None` when it cannot be read, is skipped
/// by the parse fallback, or yields no text.
pub fn read_document(path: &Path, policy: &KeyPreference, fallback: ParseFallback) -> Option<CorpusDocument> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) => {
            tracing::warn!(file = %path.display(), error = %e, "unreadable corpus file skipped");
            return None;
        }
    };
    let text = extract_document(path, &bytes, policy, fallback).filter(|t| !t.is_empty())?;
    let filename = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    tracing::debug!(file = %filename, chars = text.chars().count(), "document added");
    Some(CorpusDocument { filename, extracted_text: text })
}

/// `\n### FILE: <name>\n<text>\n` blocks joined by newlines, trimmed, then
/// cut to exactly `max_chars` characters when longer.
pub fn assemble_context(docs: &[CorpusDocument], max_chars: usize) -> String {
    let blocks: Vec<String> = docs
        .iter()
        .map(|d| format!("\n### FILE: {}\n{}\n", d.filename, d.extracted_text))
        .collect();
    let full = blocks.join("\n");
    let full = full.trim();
    match full.char_indices().nth(max_chars) {
        Some((cut, _)) => full[..cut].to_string(),
        None => full.to_string(),
    }
}
