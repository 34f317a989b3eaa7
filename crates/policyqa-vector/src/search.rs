use anyhow::{anyhow, Result};
use arrow_array::{Float32Array, RecordBatch};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase, Select};
use lancedb::{DistanceType, Table};
use std::sync::Arc;
use tokio::runtime::Runtime;

use policyqa_core::traits::PassageIndex;
use policyqa_core::types::{IndexedPassage, RetrievalResult};

use crate::schema::{DISTANCE_COL, ID_COL, METADATA_COL, TEXT_COL};
use crate::table::{opt_str, parse_metadata, peek, string_col};

/// Blocking `PassageIndex` over one LanceDB table.
pub struct LancePassageIndex {
	rt: Arc<Runtime>,
	table: Table,
	table_name: String,
}

impl LancePassageIndex {
	pub(crate) fn new(rt: Arc<Runtime>, table: Table, table_name: &str) -> Self {
		Self { rt, table, table_name: table_name.to_string() }
	}

	pub fn peek(&self, limit: usize) -> Result<Vec<IndexedPassage>> {
		self.rt.block_on(peek(&self.table, limit))
	}
}

pub(crate) fn distance_col(batch: &RecordBatch) -> Result<&Float32Array> {
	batch
		.column_by_name(DISTANCE_COL)
		.and_then(|c| c.as_any().downcast_ref::<Float32Array>())
		.ok_or_else(|| anyhow!("column '{}' missing or not float32", DISTANCE_COL))
}

/// Row text, falling back to well-known metadata fields when the text column is null or empty.
fn row_text(batch: &RecordBatch, i: usize) -> Result<String> {
	let text = opt_str(string_col(batch, TEXT_COL).ok(), i).unwrap_or_default();
	if !text.is_empty() { return Ok(text.to_string()); }
	let probe = IndexedPassage { metadata: parse_metadata(opt_str(string_col(batch, METADATA_COL).ok(), i)), ..Default::default() };
	Ok(probe.display_text().to_string())
}

impl PassageIndex for LancePassageIndex {
	fn search_vec(&self, query_vec: &[f32], k: usize) -> Result<Vec<RetrievalResult>> {
		self.rt.block_on(async {
			let mut stream = self.table
				.vector_search(query_vec.to_vec())?
				.distance_type(DistanceType::Cosine)
				.select(Select::columns(&[ID_COL, TEXT_COL, METADATA_COL]))
				.limit(k)
				.execute()
				.await?;
			let mut hits = Vec::new();
			while let Some(batch) = stream.try_next().await? {
				let ids = string_col(&batch, ID_COL)?;
				let distances = distance_col(&batch)?;
				for i in 0..batch.num_rows() {
					hits.push(RetrievalResult::semantic(ids.value(i), row_text(&batch, i)?, distances.value(i)));
				}
			}
			tracing::debug!(table = %self.table_name, k, hits = hits.len(), "vector search");
			Ok::<_, anyhow::Error>(hits)
		})
	}

	fn search_contains(&self, pattern: &str, limit: usize) -> Result<Vec<RetrievalResult>> {
		if limit == 0 { return Ok(Vec::new()); }
		self.rt.block_on(async {
			let mut stream = self.table
				.query()
				.select(Select::columns(&[ID_COL, TEXT_COL, METADATA_COL]))
				.execute()
				.await?;
			let mut hits = Vec::new();
			while let Some(batch) = stream.try_next().await? {
				let ids = string_col(&batch, ID_COL)?;
				let texts = string_col(&batch, TEXT_COL).ok();
				for i in 0..batch.num_rows() {
					let Some(text) = opt_str(texts, i) else { continue };
					if !text.contains(pattern) { continue; }
					hits.push(RetrievalResult::exact(ids.value(i), text));
					if hits.len() >= limit { return Ok(hits); }
				}
			}
			Ok::<_, anyhow::Error>(hits)
		})
	}

	fn sample(&self) -> Result<Option<IndexedPassage>> {
		Ok(self.peek(1)?.into_iter().next())
	}

	fn count(&self) -> Result<usize> {
		Ok(self.rt.block_on(self.table.count_rows(None))?)
	}
}
