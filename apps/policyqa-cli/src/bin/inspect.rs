use anyhow::{anyhow, Result};
use clap::Parser;

use policyqa_core::config::expand_path;
use policyqa_core::types::{preview, ANSWER_PREVIEW_CHARS};
use policyqa_vector::LanceStore;

/// Lists the tables of a LanceDB directory and previews a few records.
#[derive(Debug, Parser)]
#[command(name = "policyqa-inspect")]
struct Args {
    /// LanceDB directory (overrides index.path)
    #[arg(long)]
    db: Option<String>,
    /// Table to preview; defaults to the first one listed
    table: Option<String>,
    /// Records to preview
    #[arg(short = 'n', long, default_value_t = 3)]
    limit: usize,
}

fn main() -> Result<()> {
    policyqa_cli::init();
    let args = Args::parse();
    let settings = policyqa_cli::load_settings()?;
    let db_path = expand_path(args.db.as_deref().unwrap_or(&settings.index.path));
    let store = LanceStore::open(&db_path.to_string_lossy())?;

    let tables = store.tables()?;
    println!("Tables in {}:", store.uri());
    for t in &tables {
        println!("- {} ({} rows)", t.name, t.rows);
    }
    let name = match args.table.or_else(|| tables.first().map(|t| t.name.clone())) {
        Some(n) => n,
        None => return Err(anyhow!("no tables in {}", db_path.display())),
    };

    let index = store.passage_index(&name)?;
    println!("\nFirst {} records of {}:", args.limit, name);
    for p in index.peek(args.limit)? {
        println!("ID: {}", p.id);
        println!("TEXT: {}", preview(p.display_text(), ANSWER_PREVIEW_CHARS));
        let mut keys: Vec<_> = p.metadata.keys().collect();
        keys.sort();
        println!("dim: {}, metadata keys: {:?}\n", p.embedding.len(), keys);
    }
    Ok(())
}
