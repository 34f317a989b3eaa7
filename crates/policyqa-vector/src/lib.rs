//! policyqa-vector
//!
//! LanceDB-backed passage index: cosine nearest-neighbor search, verbatim
//! substring lookup, record sampling and counts, all behind the blocking
//! `PassageIndex` trait.

pub mod schema;
pub mod search;
pub mod table;
pub mod writer;

pub use search::LancePassageIndex;
pub use table::{LanceStore, TableSummary};
