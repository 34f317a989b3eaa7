use anyhow::{Result, anyhow};
use arrow_array::{RecordBatch, RecordBatchIterator, FixedSizeListArray, StringArray};
use lancedb::Connection;

use policyqa_core::types::IndexedPassage;

use crate::schema::build_passage_schema;
use crate::table::LanceStore;

impl LanceStore {
	/// Appends passages to `table`, creating it on first write. All embeddings
	/// must share one dimension. Returns the number of rows written.
	pub fn write_passages(&self, table: &str, passages: &[IndexedPassage]) -> Result<usize> {
		if passages.is_empty() { return Ok(0); }
		let batch = passages_to_record_batch(passages)?;
		self.runtime().block_on(insert_batch(self.connection(), table, batch))?;
		tracing::info!(table, rows = passages.len(), "passages written");
		Ok(passages.len())
	}
}

async fn insert_batch(db: &Connection, table: &str, batch: RecordBatch) -> Result<()> {
	let schema = batch.schema();
	let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
	if db.table_names().execute().await?.iter().any(|n| n == table) {
		db.open_table(table).execute().await?.add(reader).execute().await?;
	} else {
		db.create_table(table, reader).execute().await?;
	}
	Ok(())
}

fn passages_to_record_batch(passages: &[IndexedPassage]) -> Result<RecordBatch> {
	let dim = passages[0].embedding.len();
	if dim == 0 { return Err(anyhow!("passage '{}' has an empty embedding", passages[0].id)); }
	if let Some(bad) = passages.iter().find(|p| p.embedding.len() != dim) {
		return Err(anyhow!("passage '{}' has dim {}, expected {}", bad.id, bad.embedding.len(), dim));
	}
	let schema = build_passage_schema(i32::try_from(dim)?);
	let mut ids = Vec::new(); let mut texts = Vec::new(); let mut metas = Vec::new(); let mut vectors: Vec<Option<Vec<Option<f32>>>> = Vec::new();
	for p in passages {
		ids.push(p.id.clone());
		texts.push(Some(p.text.clone()));
		metas.push(if p.metadata.is_empty() { None } else { Some(serde_json::to_string(&p.metadata)?) });
		vectors.push(Some(p.embedding.iter().map(|&x| Some(x)).collect()));
	}
	let record_batch = RecordBatch::try_new(schema, vec![
		std::sync::Arc::new(StringArray::from(ids)),
		std::sync::Arc::new(StringArray::from(texts)),
		std::sync::Arc::new(StringArray::from(metas)),
		std::sync::Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(vectors.into_iter(), i32::try_from(dim)?)),
	])?;
	Ok(record_batch)
}
