//! LanceDB connection and row decoding helpers.
//!
//! `LanceStore` owns the tokio runtime that drives LanceDB's async API so the
//! rest of the pipeline can stay blocking.

use anyhow::{Result, anyhow};
use arrow_array::cast::AsArray;
use arrow_array::types::Float32Type;
use arrow_array::{Array, FixedSizeListArray, RecordBatch, StringArray};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{connect, Connection, Table};
use std::sync::Arc;
use tokio::runtime::Runtime;

use policyqa_core::types::{IndexedPassage, Meta};

use crate::schema::{ID_COL, METADATA_COL, TEXT_COL, VECTOR_COL};
use crate::search::LancePassageIndex;

pub async fn open_db(uri: &str) -> Result<Connection> {
    Ok(connect(uri).execute().await?)
}

/// Name and row count of one table in the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSummary {
    pub name: String,
    pub rows: usize,
}

pub struct LanceStore {
    rt: Arc<Runtime>,
    conn: Connection,
    uri: String,
}

impl LanceStore {
    pub fn open(uri: &str) -> Result<Self> {
        let rt = Arc::new(Runtime::new()?);
        let conn = rt.block_on(open_db(uri))?;
        tracing::debug!(uri, "opened lancedb");
        Ok(Self { rt, conn, uri: uri.to_string() })
    }

    pub fn uri(&self) -> &str { &self.uri }

    pub fn tables(&self) -> Result<Vec<TableSummary>> {
        self.rt.block_on(async {
            let mut out = Vec::new();
            for name in self.conn.table_names().execute().await? {
                let rows = self.conn.open_table(&name).execute().await?.count_rows(None).await?;
                out.push(TableSummary { name, rows });
            }
            Ok::<_, anyhow::Error>(out)
        })
    }

    /// Opens `table` as a read-only passage index. Fails when the table is absent.
    pub fn passage_index(&self, table: &str) -> Result<LancePassageIndex> {
        let handle = self.rt.block_on(async {
            let names = self.conn.table_names().execute().await?;
            if !names.iter().any(|n| n == table) {
                return Err(anyhow!("table '{}' not found in {} (have: {:?})", table, self.uri, names));
            }
            Ok(self.conn.open_table(table).execute().await?)
        })?;
        Ok(LancePassageIndex::new(Arc::clone(&self.rt), handle, table))
    }

    pub(crate) fn runtime(&self) -> &Runtime { &self.rt }
    pub(crate) fn connection(&self) -> &Connection { &self.conn }
}

/// First `limit` records of `table` in storage order, all fields decoded.
pub async fn peek(table: &Table, limit: usize) -> Result<Vec<IndexedPassage>> {
    let mut stream = table.query().limit(limit).execute().await?;
    let mut out = Vec::new();
    while let Some(batch) = stream.try_next().await? {
        for i in 0..batch.num_rows() {
            out.push(decode_passage(&batch, i)?);
            if out.len() >= limit { return Ok(out); }
        }
    }
    Ok(out)
}

pub(crate) fn string_col<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| anyhow!("column '{}' missing or not utf8", name))
}

pub(crate) fn opt_str(col: Option<&StringArray>, i: usize) -> Option<&str> {
    col.filter(|c| c.is_valid(i)).map(|c| c.value(i))
}

/// Parses the JSON metadata column; non-string values are kept in their JSON form.
pub(crate) fn parse_metadata(raw: Option<&str>) -> Meta {
    let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else { return Meta::new() };
    match serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(raw) {
        Ok(map) => map
            .into_iter()
            .map(|(k, v)| {
                let v = match v { serde_json::Value::String(s) => s, other => other.to_string() };
                (k, v)
            })
            .collect(),
        Err(e) => {
            tracing::debug!(error = %e, "metadata is not a JSON object");
            Meta::new()
        }
    }
}

pub(crate) fn decode_passage(batch: &RecordBatch, i: usize) -> Result<IndexedPassage> {
    let ids = string_col(batch, ID_COL)?;
    let texts = string_col(batch, TEXT_COL).ok();
    let metas = string_col(batch, METADATA_COL).ok();
    let embedding = batch
        .column_by_name(VECTOR_COL)
        .and_then(|c| c.as_any().downcast_ref::<FixedSizeListArray>())
        .filter(|fsl| fsl.is_valid(i))
        .map(|fsl| fsl.value(i).as_primitive::<Float32Type>().values().to_vec())
        .unwrap_or_default();
    Ok(IndexedPassage {
        id: ids.value(i).to_string(),
        text: opt_str(texts, i).unwrap_or_default().to_string(),
        embedding,
        metadata: parse_metadata(opt_str(metas, i)),
    })
}
