//! Startup check that the index and the embedding model agree on dimension.

use policyqa_core::error::PipelineError;
use policyqa_core::traits::{Embedder, PassageIndex};
use policyqa_core::types::preview;

/// Probe string embedded to measure the model's output dimension.
pub const PROBE_TEXT: &str = "test";

/// Dimensions observed by [`CompatibilityValidator::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimensionReport {
    /// `None` when the index is empty or its sample carries no vector.
    pub index_dim: Option<usize>,
    pub model_dim: usize,
}

pub struct CompatibilityValidator;

impl CompatibilityValidator {
    /// Dimension of one stored record, logging its id and a text preview.
    pub fn probe_index(index: &dyn PassageIndex) -> Result<Option<usize>, PipelineError> {
        let sample = index.sample().map_err(|e| PipelineError::IndexUnavailable(e.to_string()))?;
        let Some(record) = sample else {
            tracing::info!("probe: index is empty");
            return Ok(None);
        };
        let dim = record.embedding.len();
        tracing::info!(id = %record.id, preview = %preview(record.display_text(), 200), dim, "probe");
        Ok((dim > 0).then_some(dim))
    }

    pub fn model_dim(embedder: &dyn Embedder) -> Result<usize, PipelineError> {
        let probe = embedder
            .embed_batch(&[PROBE_TEXT.to_string()], true)
            .map_err(|e| PipelineError::InvalidConfig(format!("embedding probe failed: {e}")))?;
        probe
            .first()
            .map(Vec::len)
            .ok_or_else(|| PipelineError::InvalidConfig("embedding probe returned no vector".into()))
    }

    /// Fails with `DimensionMismatch` when both dimensions are known and differ.
    pub fn check(index: &dyn PassageIndex, embedder: &dyn Embedder) -> Result<DimensionReport, PipelineError> {
        let index_dim = Self::probe_index(index)?;
        let model_dim = Self::model_dim(embedder)?;
        match index_dim {
            Some(d) if d != model_dim => {
                tracing::error!(collection = d, model = model_dim, "embedding dim mismatch");
                Err(PipelineError::DimensionMismatch { index: d, model: model_dim })
            }
            _ => {
                tracing::info!(collection = ?index_dim, model = model_dim, "embedding dim check ok");
                Ok(DimensionReport { index_dim, model_dim })
            }
        }
    }
}
