use thiserror::Error;

/// Failures that stop the pipeline before it serves a request, plus caller
/// argument errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("Embedding dim mismatch: collection={index}, model={model}")]
    DimensionMismatch { index: usize, model: usize },

    #[error("Context too short ({len} chars, need more than {min}). Check the corpus files.")]
    CorpusTooShort { len: usize, min: usize },

    #[error("Index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl PipelineError {
    /// Fatal preconditions abort the process; argument errors do not.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::InvalidArgument(_))
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
