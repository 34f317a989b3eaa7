//! Sequential question × model benchmark over a whole-corpus context.

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;

use policyqa_core::config::{expand_path, BenchSettings};
use policyqa_core::error::PipelineError;
use policyqa_core::traits::{CompletionRequest, LanguageModel};
use policyqa_core::types::{preview, BenchmarkRecord, ANSWER_PREVIEW_CHARS};
use policyqa_rag::PromptComposer;

use crate::corpus::{assemble_context, load_corpus, KeyPreference};
use crate::report::write_report;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BenchPhase {
    Idle,
    LoadingCorpus,
    Running,
    Reporting,
    Done,
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct BenchReport {
    pub context_chars: usize,
    pub records: Vec<BenchmarkRecord>,
    pub out_file: PathBuf,
}

impl BenchReport {
    pub fn failures(&self) -> usize {
        self.records.iter().filter(|r| r.answer_preview.starts_with("ERROR: ")).count()
    }
}

pub struct BenchmarkRunner<M> where M: LanguageModel {
    model: M,
    settings: BenchSettings,
    composer: PromptComposer,
    policy: KeyPreference,
    phase: BenchPhase,
}

impl<M> BenchmarkRunner<M> where M: LanguageModel {
    pub fn new(model: M, settings: BenchSettings) -> Result<Self> {
        Ok(Self {
            model,
            settings,
            composer: PromptComposer::benchmark(),
            policy: KeyPreference::standard()?,
            phase: BenchPhase::Idle,
        })
    }

    pub fn phase(&self) -> BenchPhase { self.phase }

    fn enter(&mut self, next: BenchPhase) {
        tracing::info!(from = ?self.phase, to = ?next, "benchmark phase");
        self.phase = next;
    }

    /// Loads and assembles the corpus. Fails with `CorpusTooShort` before any
    /// model call when the context is not longer than `min_context_chars`.
    pub fn load_context(&mut self) -> Result<String> {
        self.enter(BenchPhase::LoadingCorpus);
        let dir = expand_path(&self.settings.data_dir);
        let docs = load_corpus(&dir, &self.policy, self.settings.parse_fallback)?;
        let context = assemble_context(&docs, self.settings.max_context_chars);
        let len = context.chars().count();
        tracing::info!(documents = docs.len(), chars = len, "context assembled");
        tracing::debug!(preview = %context.chars().take(800).collect::<String>(), "context preview");
        if len <= self.settings.min_context_chars {
            return Err(PipelineError::CorpusTooShort { len, min: self.settings.min_context_chars }.into());
        }
        Ok(context)
    }

    /// One call, timed. Failures become zeroed `ERROR:` records.
    pub fn ask_once(&self, model: &str, context: &str, question: &str) -> BenchmarkRecord {
        let prompt = self.composer.compose_with_context(question, context);
        let request = CompletionRequest {
            model: model.to_string(),
            system: prompt.system,
            user: prompt.user,
            temperature: None,
        };
        let started = Instant::now();
        match self.model.complete(&request) {
            Ok(c) => {
                let latency = round3(started.elapsed().as_secs_f64());
                tracing::info!(model, question = %short(question), latency, tokens = c.total_tokens, "ok");
                BenchmarkRecord {
                    model: model.to_string(),
                    question: question.to_string(),
                    latency_seconds: latency,
                    input_tokens: c.input_tokens,
                    output_tokens: c.output_tokens,
                    total_tokens: c.total_tokens,
                    answer_preview: preview(&c.text, ANSWER_PREVIEW_CHARS),
                }
            }
            Err(e) => {
                tracing::error!(model, question = %short(question), error = %e, "call failed");
                BenchmarkRecord::failed(model, question, &e.to_string())
            }
        }
    }

    /// Outer loop over questions, inner over models. Always `Q × M` records.
    pub fn run_matrix(&mut self, context: &str) -> Result<Vec<BenchmarkRecord>> {
        self.enter(BenchPhase::Running);
        let total = self.settings.questions.len() * self.settings.models.len();
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} calls {msg}")?
                .progress_chars("#>-"),
        );
        let mut records = Vec::with_capacity(total);
        for question in &self.settings.questions {
            for model in &self.settings.models {
                pb.set_message(model.clone());
                records.push(self.ask_once(model, context, question));
                pb.inc(1);
            }
        }
        pb.finish_and_clear();
        Ok(records)
    }

    /// Full run: load the corpus, call every model, write the CSV report.
    pub fn run(&mut self) -> Result<BenchReport> {
        let context = self.load_context()?;
        let records = self.run_matrix(&context)?;
        self.enter(BenchPhase::Reporting);
        let out_file = expand_path(&self.settings.out_file);
        write_report(&out_file, &records)?;
        self.enter(BenchPhase::Done);
        Ok(BenchReport { context_chars: context.chars().count(), records, out_file })
    }
}

fn round3(secs: f64) -> f64 {
    (secs * 1000.0).round() / 1000.0
}

fn short(question: &str) -> String {
    question.chars().take(40).collect()
}
