use crate::types::{IndexedPassage, RetrievalResult};

/// Text embedding collaborator. Deterministic for identical input.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    /// One vector per input text, in order. `normalize` requests unit L2 norm.
    fn embed_batch(&self, texts: &[String], normalize: bool) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Read-only view of a pre-populated passage store.
pub trait PassageIndex: Send + Sync {
    /// `k` nearest records to `query_vec`, ranked by the store, with raw distances.
    fn search_vec(&self, query_vec: &[f32], k: usize) -> anyhow::Result<Vec<RetrievalResult>>;
    /// Records whose text contains `pattern` verbatim, in the store's native
    /// order, at most `limit` of them. Distances are `None`.
    fn search_contains(&self, pattern: &str, limit: usize) -> anyhow::Result<Vec<RetrievalResult>>;
    /// One record with all fields, or `None` when the store is empty.
    fn sample(&self) -> anyhow::Result<Option<IndexedPassage>>;
    fn count(&self) -> anyhow::Result<usize>;
}

/// A single chat request to a language model.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub system: String,
    pub user: String,
    /// `None` leaves the provider default in place.
    pub temperature: Option<f32>,
}

/// Response text plus usage counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
}

/// Language-model collaborator. Failures come back as `Err`, never as an
/// empty `Completion`.
pub trait LanguageModel: Send + Sync {
    fn complete(&self, request: &CompletionRequest) -> anyhow::Result<Completion>;
}

impl<T: Embedder + ?Sized> Embedder for Box<T> {
    fn dim(&self) -> usize { (**self).dim() }
    fn max_len(&self) -> usize { (**self).max_len() }
    fn embed_batch(&self, texts: &[String], normalize: bool) -> anyhow::Result<Vec<Vec<f32>>> {
        (**self).embed_batch(texts, normalize)
    }
}

impl<T: PassageIndex + ?Sized> PassageIndex for Box<T> {
    fn search_vec(&self, query_vec: &[f32], k: usize) -> anyhow::Result<Vec<RetrievalResult>> {
        (**self).search_vec(query_vec, k)
    }
    fn search_contains(&self, pattern: &str, limit: usize) -> anyhow::Result<Vec<RetrievalResult>> {
        (**self).search_contains(pattern, limit)
    }
    fn sample(&self) -> anyhow::Result<Option<IndexedPassage>> { (**self).sample() }
    fn count(&self) -> anyhow::Result<usize> { (**self).count() }
}

impl<T: LanguageModel + ?Sized> LanguageModel for Box<T> {
    fn complete(&self, request: &CompletionRequest) -> anyhow::Result<Completion> {
        (**self).complete(request)
    }
}

impl<T: LanguageModel + ?Sized> LanguageModel for &T {
    fn complete(&self, request: &CompletionRequest) -> anyhow::Result<Completion> {
        (**self).complete(request)
    }
}
