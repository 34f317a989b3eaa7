use anyhow::Result;
use clap::Parser;

use policyqa_bench::BenchmarkRunner;
use policyqa_llm::OpenAiClient;

/// Runs every configured question against every configured model over the
/// static corpus and writes a CSV report.
#[derive(Debug, Parser)]
#[command(name = "policyqa-bench")]
struct Args {
    /// Corpus directory (overrides bench.data_dir)
    #[arg(long)]
    data_dir: Option<String>,
    /// Report path (overrides bench.out_file)
    #[arg(short, long)]
    out: Option<String>,
    /// Comma-separated model list (overrides bench.models)
    #[arg(long, value_delimiter = ',')]
    models: Vec<String>,
}

fn main() -> Result<()> {
    policyqa_cli::init();
    let args = Args::parse();
    let mut settings = policyqa_cli::load_settings()?;
    if let Some(dir) = args.data_dir { settings.bench.data_dir = dir; }
    if let Some(out) = args.out { settings.bench.out_file = out; }
    if !args.models.is_empty() { settings.bench.models = args.models; }

    let client = OpenAiClient::with_base_url(settings.require_api_key()?, &settings.llm.api_base)?;
    tracing::info!(cwd = ?std::env::current_dir().ok(), data_dir = %settings.bench.data_dir, "starting benchmark");
    let mut runner = BenchmarkRunner::new(client, settings.bench)?;
    let report = runner.run()?;
    println!(
        "Saved: {} ({} rows, {} failed, context {} chars)",
        report.out_file.display(),
        report.records.len(),
        report.failures(),
        report.context_chars
    );
    Ok(())
}
