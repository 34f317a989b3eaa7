pub mod answer;
pub mod pipeline;
pub mod prompt;
pub mod retrieval;
pub mod session;
pub mod validator;

pub use answer::AnswerService;
pub use pipeline::PipelineContext;
pub use prompt::{Prompt, PromptComposer};
pub use retrieval::RetrievalEngine;
pub use session::run_session;
pub use validator::{CompatibilityValidator, DimensionReport};
