#![deny(unused_imports)]

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use error::PipelineError;
pub use types::{
    BenchmarkRecord, CorpusDocument, GroundedAnswer, IndexedPassage, RetrievalResult, REFUSAL,
};
