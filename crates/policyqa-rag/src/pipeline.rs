//! Explicitly initialized pipeline: credential, index and dimension checks run
//! once, then `ask` serves questions against the owned gateways.

use policyqa_core::config::Settings;
use policyqa_core::error::PipelineError;
use policyqa_core::traits::{Embedder, LanguageModel, PassageIndex};
use policyqa_core::types::{preview, GroundedAnswer, RetrievalResult};

use crate::answer::AnswerService;
use crate::prompt::PromptComposer;
use crate::retrieval::RetrievalEngine;
use crate::validator::{CompatibilityValidator, DimensionReport};

pub type DynRetrieval = RetrievalEngine<Box<dyn PassageIndex>, Box<dyn Embedder>>;

pub struct PipelineContext {
    retrieval: DynRetrieval,
    composer: PromptComposer,
    answers: AnswerService<Box<dyn LanguageModel>>,
    record_count: usize,
    dims: DimensionReport,
}

impl PipelineContext {
    /// Fails with a fatal `PipelineError` when the credential is missing, the
    /// index cannot be read, or the dimensions disagree.
    pub fn initialize(
        settings: &Settings,
        embedder: Box<dyn Embedder>,
        index: Box<dyn PassageIndex>,
        model: Box<dyn LanguageModel>,
    ) -> Result<Self, PipelineError> {
        settings.require_api_key()?;
        let record_count = index.count().map_err(|e| PipelineError::IndexUnavailable(e.to_string()))?;
        tracing::info!(records = record_count, table = %settings.index.table, "index opened");
        let dims = CompatibilityValidator::check(index.as_ref(), embedder.as_ref())?;
        Ok(Self {
            retrieval: RetrievalEngine::new(index, embedder, settings.retrieval.top_k),
            composer: PromptComposer::interactive(),
            answers: AnswerService::new(model, settings.llm.model.clone()),
            record_count,
            dims,
        })
    }

    pub fn record_count(&self) -> usize { self.record_count }
    pub fn dimensions(&self) -> DimensionReport { self.dims }

    /// Answer with the configured `top_k`.
    pub fn ask(&self, question: &str) -> GroundedAnswer {
        let k = self.retrieval.default_k();
        match self.ask_with_k(question, k) {
            Ok(a) => a,
            Err(e) => {
                tracing::error!(error = %e, "ask failed");
                GroundedAnswer::refusal()
            }
        }
    }

    pub fn ask_with_k(&self, question: &str, k: usize) -> Result<GroundedAnswer, PipelineError> {
        if k == 0 {
            return Err(PipelineError::InvalidArgument("k must be >= 1".into()));
        }
        let passages = match self.retrieval.retrieve(question, k) {
            Ok(p) => p,
            Err(e) => {
                tracing::error!(error = %e, "retrieval failed");
                return Ok(GroundedAnswer { text: format!("[retrieval error] {e:#}"), citation_ids: Vec::new() });
            }
        };
        log_passages(&passages);
        let prompt = self.composer.compose(question, &passages);
        let ids = passages.into_iter().map(|p| p.id).collect();
        Ok(self.answers.answer(&prompt, ids))
    }

    /// Releases the index connection and the other gateways.
    pub fn close(self) {
        tracing::debug!("pipeline closed");
    }
}

fn log_passages(passages: &[RetrievalResult]) {
    for (rank, p) in passages.iter().enumerate() {
        tracing::debug!(
            rank = rank + 1,
            id = %p.id,
            distance = ?p.distance,
            similarity = p.similarity(),
            preview = %preview(&p.text, 200),
            "passage"
        );
    }
}
