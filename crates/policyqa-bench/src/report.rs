use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

use policyqa_core::types::BenchmarkRecord;

pub const HEADER: [&str; 7] = [
    "model", "question", "latency_s", "input_tokens", "output_tokens", "total_tokens", "answer_preview",
];

/// Header row followed by one row per record, in the order given.
pub fn write_records<W: Write>(out: W, records: &[BenchmarkRecord]) -> Result<()> {
    let mut w = csv::WriterBuilder::new().has_headers(false).from_writer(out);
    w.write_record(HEADER)?;
    for r in records {
        w.serialize(r)?;
    }
    w.flush()?;
    Ok(())
}

pub fn write_report(path: &Path, records: &[BenchmarkRecord]) -> Result<()> {
    let file = std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    write_records(file, records)?;
    tracing::info!(path = %path.display(), rows = records.len(), "report saved");
    Ok(())
}
