pub mod corpus;
pub mod report;
pub mod runner;

pub use corpus::{assemble_context, load_corpus, read_document, DocNode, KeyPreference};
pub use report::{write_records, write_report};
pub use runner::{BenchPhase, BenchReport, BenchmarkRunner};
