use anyhow::Result;

use policyqa_core::error::PipelineError;
use policyqa_core::traits::{Embedder, PassageIndex};
use policyqa_core::types::RetrievalResult;

/// Exact-first, semantic-fallback retrieval over a passage index.
pub struct RetrievalEngine<I, E> where I: PassageIndex, E: Embedder {
    index: I,
    embedder: E,
    default_k: usize,
}

impl<I, E> RetrievalEngine<I, E> where I: PassageIndex, E: Embedder {
    pub fn new(index: I, embedder: E, default_k: usize) -> Self { Self { index, embedder, default_k } }

    pub fn default_k(&self) -> usize { self.default_k }

    /// Up to `k` passages for `question`.
    ///
    /// 1) passages containing the question verbatim, in index order, distance `None`;
    /// 2) otherwise the `k` nearest neighbors of the normalized question vector,
    ///    with the index's raw distances and order;
    /// 3) otherwise nothing.
    pub fn retrieve(&self, question: &str, k: usize) -> Result<Vec<RetrievalResult>> {
        if k == 0 {
            return Err(PipelineError::InvalidArgument("k must be >= 1".into()).into());
        }
        let exact = self.index.search_contains(question, k)?;
        if !exact.is_empty() {
            tracing::debug!(hits = exact.len(), "retrieval: exact match");
            return Ok(exact);
        }
        let q_vec = self
            .embedder
            .embed_batch(&[question.to_string()], true)?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("embedder returned no vector for the question"))?;
        let semantic = self.index.search_vec(&q_vec, k)?;
        tracing::debug!(hits = semantic.len(), "retrieval: semantic fallback");
        Ok(semantic)
    }
}
