use anyhow::Result;
use clap::Parser;
use std::io;

use policyqa_core::config::expand_path;
use policyqa_core::error::PipelineError;
use policyqa_embed::get_default_embedder;
use policyqa_llm::OpenAiClient;
use policyqa_rag::session::GOODBYE;
use policyqa_rag::{run_session, PipelineContext};
use policyqa_vector::LanceStore;

/// Grounded Q&A over the policy index.
#[derive(Debug, Parser)]
#[command(name = "policyqa-ask")]
struct Args {
    /// LanceDB directory (overrides index.path)
    #[arg(long)]
    db: Option<String>,
    /// Table to query (overrides index.table)
    #[arg(long)]
    table: Option<String>,
    /// Passages per question (overrides retrieval.top_k)
    #[arg(short = 'k', long)]
    top_k: Option<usize>,
    /// Chat model (overrides llm.model)
    #[arg(long)]
    model: Option<String>,
    /// Answer one question and exit instead of starting a session
    question: Option<String>,
}

fn main() -> Result<()> {
    policyqa_cli::init();
    let args = Args::parse();
    let mut settings = policyqa_cli::load_settings()?;
    if let Some(db) = args.db { settings.index.path = db; }
    if let Some(table) = args.table { settings.index.table = table; }
    if let Some(k) = args.top_k { settings.retrieval.top_k = k; }
    if let Some(model) = args.model { settings.llm.model = model; }
    settings.validate()?;

    let client = OpenAiClient::with_base_url(settings.require_api_key()?, &settings.llm.api_base)?;
    let db_path = expand_path(&settings.index.path);
    let store = LanceStore::open(&db_path.to_string_lossy())
        .map_err(|e| PipelineError::IndexUnavailable(format!("{}: {e}", db_path.display())))?;
    let index = store
        .passage_index(&settings.index.table)
        .map_err(|e| PipelineError::IndexUnavailable(e.to_string()))?;
    let embedder = get_default_embedder(&settings.embedding)?;
    let ctx = PipelineContext::initialize(&settings, embedder, Box::new(index), Box::new(client))?;

    if let Some(q) = args.question {
        let answer = ctx.ask(&q);
        println!("A> {}", answer.text);
        println!("   citations: {:?}", answer.citation_ids);
        ctx.close();
        return Ok(());
    }

    ctrlc::set_handler(|| {
        println!("\n{GOODBYE}");
        std::process::exit(0);
    })?;
    println!("Ready. {} passages indexed. Ask a question (empty line, exit or quit to leave).", ctx.record_count());
    run_session(&ctx, io::stdin().lock(), io::stdout())?;
    ctx.close();
    Ok(())
}
