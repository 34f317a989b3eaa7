#![allow(dead_code)]

use anyhow::{bail, Result};
use std::sync::{Arc, Mutex};

use policyqa_core::config::Settings;
use policyqa_core::traits::{Completion, CompletionRequest, Embedder, LanguageModel, PassageIndex};
use policyqa_core::types::{IndexedPassage, RetrievalResult};
use policyqa_embed::FakeEmbedder;

pub const DIM: usize = 256;

/// Brute-force cosine index over owned passages, in insertion order.
pub struct InMemoryIndex {
    pub passages: Vec<IndexedPassage>,
}

impl InMemoryIndex {
    /// Passages embedded with `FakeEmbedder::new(dim)`.
    pub fn embedded(dim: usize, rows: &[(&str, &str)]) -> Self {
        let embedder = FakeEmbedder::new(dim);
        let texts: Vec<String> = rows.iter().map(|(_, t)| t.to_string()).collect();
        let vecs = embedder.embed_batch(&texts, true).expect("embed");
        let passages = rows
            .iter()
            .zip(vecs)
            .map(|((id, text), embedding)| IndexedPassage {
                id: id.to_string(),
                text: text.to_string(),
                embedding,
                ..Default::default()
            })
            .collect();
        Self { passages }
    }
}

fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 { 1.0 } else { 1.0 - dot / (na * nb) }
}

impl PassageIndex for InMemoryIndex {
    fn search_vec(&self, query_vec: &[f32], k: usize) -> Result<Vec<RetrievalResult>> {
        let mut scored: Vec<RetrievalResult> = self
            .passages
            .iter()
            .map(|p| RetrievalResult::semantic(&p.id, &p.text, cosine_distance(query_vec, &p.embedding)))
            .collect();
        scored.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }

    fn search_contains(&self, pattern: &str, limit: usize) -> Result<Vec<RetrievalResult>> {
        Ok(self
            .passages
            .iter()
            .filter(|p| p.text.contains(pattern))
            .take(limit)
            .map(|p| RetrievalResult::exact(&p.id, &p.text))
            .collect())
    }

    fn sample(&self) -> Result<Option<IndexedPassage>> { Ok(self.passages.first().cloned()) }
    fn count(&self) -> Result<usize> { Ok(self.passages.len()) }
}

/// Index whose every call fails.
pub struct BrokenIndex;

impl PassageIndex for BrokenIndex {
    fn search_vec(&self, _: &[f32], _: usize) -> Result<Vec<RetrievalResult>> { bail!("index offline") }
    fn search_contains(&self, _: &str, _: usize) -> Result<Vec<RetrievalResult>> { bail!("index offline") }
    fn sample(&self) -> Result<Option<IndexedPassage>> { bail!("index offline") }
    fn count(&self) -> Result<usize> { bail!("index offline") }
}

/// Returns a fixed reply and records every request it sees.
#[derive(Clone)]
pub struct ScriptedModel {
    pub reply: String,
    pub calls: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl ScriptedModel {
    pub fn new(reply: &str) -> Self {
        Self { reply: reply.to_string(), calls: Arc::new(Mutex::new(Vec::new())) }
    }

    pub fn call_count(&self) -> usize { self.calls.lock().expect("lock").len() }
}

impl LanguageModel for ScriptedModel {
    fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        self.calls.lock().expect("lock").push(request.clone());
        Ok(Completion { text: self.reply.clone(), input_tokens: 10, output_tokens: 5, total_tokens: 15 })
    }
}

pub struct FailingModel;

impl LanguageModel for FailingModel {
    fn complete(&self, _: &CompletionRequest) -> Result<Completion> { bail!("rate limited") }
}

pub fn settings_with_key() -> Settings {
    let mut s = Settings::default();
    s.llm.api_key = Some("sk-test".to_string());
    s
}

pub fn policy_rows() -> Vec<(&'static str, &'static str)> {
    vec![
        ("p1", "The Project Manager approves the Development Phase deliverables."),
        ("p2", "What are the exit criteria? The exit criteria are a signed acceptance memo and a passed stage gate review."),
        ("p3", "Section 3 describes the Implementation Phase and its release readiness review."),
        ("p4", "Budget variance above ten percent requires a change request."),
    ]
}

/// Readable at startup (count and sample work) but every search fails.
pub struct SearchDown {
    pub inner: InMemoryIndex,
}

impl PassageIndex for SearchDown {
    fn search_vec(&self, _: &[f32], _: usize) -> Result<Vec<RetrievalResult>> { bail!("index offline") }
    fn search_contains(&self, _: &str, _: usize) -> Result<Vec<RetrievalResult>> { bail!("index offline") }
    fn sample(&self) -> Result<Option<IndexedPassage>> { self.inner.sample() }
    fn count(&self) -> Result<usize> { self.inner.count() }
}

/// `FakeEmbedder` that counts `embed_batch` calls.
pub struct CountingEmbedder {
    pub inner: FakeEmbedder,
    pub calls: Arc<std::sync::atomic::AtomicUsize>,
}

impl CountingEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { inner: FakeEmbedder::new(dim), calls: Arc::new(std::sync::atomic::AtomicUsize::new(0)) }
    }

    pub fn call_count(&self) -> usize { self.calls.load(std::sync::atomic::Ordering::SeqCst) }
}

impl Embedder for CountingEmbedder {
    fn dim(&self) -> usize { self.inner.dim() }
    fn max_len(&self) -> usize { self.inner.max_len() }
    fn embed_batch(&self, texts: &[String], normalize: bool) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.inner.embed_batch(texts, normalize)
    }
}
