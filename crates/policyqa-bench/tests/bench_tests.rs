use anyhow::{bail, Result};
use std::fs;
use std::sync::Mutex;
use tempfile::TempDir;

use policyqa_bench::{assemble_context, load_corpus, read_document, BenchPhase, BenchmarkRunner, DocNode, KeyPreference};
use policyqa_core::config::{BenchSettings, ParseFallback};
use policyqa_core::error::PipelineError;
use policyqa_core::traits::{Completion, CompletionRequest, LanguageModel};
use policyqa_core::types::{CorpusDocument, REFUSAL};

/// Fails for one named model, answers for the rest, and records requests.
struct FlakyModel {
    broken: &'static str,
    seen: Mutex<Vec<CompletionRequest>>,
}

impl FlakyModel {
    fn new(broken: &'static str) -> Self { Self { broken, seen: Mutex::new(Vec::new()) } }
}

impl LanguageModel for FlakyModel {
    fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        self.seen.lock().unwrap().push(request.clone());
        if request.model == self.broken {
            bail!("model not found");
        }
        Ok(Completion { text: format!("answer\nfrom {}", request.model), input_tokens: 100, output_tokens: 7, total_tokens: 107 })
    }
}

fn long_policy_json() -> String {
    serde_json::json!({
        "section_title": "Development Phase exit criteria and approvals",
        "footer": "Page { DOCPROPERTY Title \\* MERGEFORMAT } footer text",
        "body": "All deliverables must be reviewed by the Project Manager before the stage gate.",
        "responsibilities": [
            {"role": "Project Manager coordinates the development activities and schedule."},
            "a bare string inside a list that is never collected"
        ],
        "content": "The Development Phase produces the tested system, the test plan, and training materials for users."
    })
    .to_string()
}

fn settings(dir: &TempDir, models: &[&str], questions: &[&str]) -> BenchSettings {
    BenchSettings {
        data_dir: dir.path().join("data").to_string_lossy().into_owned(),
        out_file: dir.path().join("result.csv").to_string_lossy().into_owned(),
        models: models.iter().map(|s| s.to_string()).collect(),
        questions: questions.iter().map(|s| s.to_string()).collect(),
        ..BenchSettings::default()
    }
}

fn seed(dir: &TempDir) {
    let data = dir.path().join("data");
    fs::create_dir_all(&data).unwrap();
    fs::write(data.join("b_policy.json"), long_policy_json()).unwrap();
    fs::write(data.join("a_notes.txt"), "Exit criteria require a signed acceptance memo from the business owner.").unwrap();
    fs::write(data.join("ignored.bin"), [0u8, 1, 2]).unwrap();
}

#[test]
fn extraction_prefers_hinted_keys_and_drops_noise() {
    let node = DocNode::from(serde_json::from_str::<serde_json::Value>(&long_policy_json()).unwrap());
    let out = KeyPreference::standard().unwrap().extract(&node);
    assert_eq!(
        out,
        vec![
            "Development Phase exit criteria and approvals".to_string(),
            "The Development Phase produces the tested system, the test plan, and training materials for users.".to_string(),
            "All deliverables must be reviewed by the Project Manager before the stage gate.".to_string(),
            "Project Manager coordinates the development activities and schedule.".to_string(),
        ]
    );
}

#[test]
fn short_strings_are_dropped() {
    let node = DocNode::Mapping(vec![
        ("title".into(), DocNode::Text("  12345678901234567890  ".into())),
        ("summary".into(), DocNode::Text("123456789012345678901".into())),
        ("count".into(), DocNode::Other),
    ]);
    assert_eq!(KeyPreference::standard().unwrap().extract(&node), vec!["123456789012345678901".to_string()]);
}

#[test]
fn corpus_files_are_sorted_and_filtered() {
    let dir = TempDir::new().unwrap();
    seed(&dir);
    let docs = load_corpus(&dir.path().join("data"), &KeyPreference::standard().unwrap(), ParseFallback::RawText).unwrap();
    let names: Vec<_> = docs.iter().map(|d| d.filename.as_str()).collect();
    assert_eq!(names, vec!["a_notes.txt", "b_policy.json"]);
}

#[test]
fn unparsable_json_follows_the_fallback() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("data");
    fs::create_dir_all(&data).unwrap();
    fs::write(data.join("broken.json"), "{ not json, but still useful prose").unwrap();
    let policy = KeyPreference::standard().unwrap();

    let raw = load_corpus(&data, &policy, ParseFallback::RawText).unwrap();
    assert_eq!(raw.len(), 1);
    assert_eq!(raw[0].extracted_text, "{ not json, but still useful prose");

    let skipped = load_corpus(&data, &policy, ParseFallback::Skip).unwrap();
    assert!(skipped.is_empty());
}

#[test]
fn context_is_cut_to_exactly_max_chars() {
    let docs = vec![
        CorpusDocument { filename: "a.json".into(), extracted_text: "é".repeat(9_000) },
        CorpusDocument { filename: "b.json".into(), extracted_text: "x".repeat(9_000) },
    ];
    let ctx = assemble_context(&docs, 12_000);
    assert_eq!(ctx.chars().count(), 12_000);
    assert!(ctx.starts_with("### FILE: a.json\n"));

    let small = assemble_context(&docs[..1], 100_000);
    assert_eq!(small, format!("### FILE: a.json\n{}", "é".repeat(9_000)));
}

#[test]
fn blocks_are_joined_by_blank_lines() {
    let docs = vec![
        CorpusDocument { filename: "a".into(), extracted_text: "one".into() },
        CorpusDocument { filename: "b".into(), extracted_text: "two".into() },
    ];
    assert_eq!(assemble_context(&docs, 1_000), "### FILE: a\none\n\n\n### FILE: b\ntwo");
}

#[test]
fn short_corpus_aborts_before_any_call() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("data");
    fs::create_dir_all(&data).unwrap();
    fs::write(data.join("tiny.txt"), "too short").unwrap();

    let model = FlakyModel::new("none");
    let mut runner = BenchmarkRunner::new(&model, settings(&dir, &["m"], &["q"])).unwrap();
    let err = runner.run().unwrap_err();
    assert!(matches!(err.downcast_ref::<PipelineError>(), Some(PipelineError::CorpusTooShort { .. })));
    assert!(model.seen.lock().unwrap().is_empty());
    assert_eq!(runner.phase(), BenchPhase::LoadingCorpus);
    assert!(!dir.path().join("result.csv").exists());
}

#[test]
fn every_question_model_pair_gets_a_row() {
    let dir = TempDir::new().unwrap();
    seed(&dir);
    let models = ["gpt-5-nano", "gpt-4o-mini", "gpt-4o"];
    let questions = ["What are the exit criteria?", "Who coordinates development?"];
    let model = FlakyModel::new("gpt-5-nano");
    let mut runner = BenchmarkRunner::new(&model, settings(&dir, &models, &questions)).unwrap();

    let report = runner.run().unwrap();
    assert_eq!(runner.phase(), BenchPhase::Done);
    assert_eq!(report.records.len(), 6);
    assert_eq!(report.failures(), 2);
    assert!(report.context_chars > 200);

    let order: Vec<(&str, &str)> = report.records.iter().map(|r| (r.question.as_str(), r.model.as_str())).collect();
    assert_eq!(order[0], (questions[0], "gpt-5-nano"));
    assert_eq!(order[2], (questions[0], "gpt-4o"));
    assert_eq!(order[3], (questions[1], "gpt-5-nano"));

    let failed = &report.records[0];
    assert_eq!((failed.latency_seconds, failed.total_tokens), (0.0, 0));
    assert_eq!(failed.answer_preview, "ERROR: model not found");
    let ok = &report.records[1];
    assert_eq!(ok.answer_preview, "answer from gpt-4o-mini");
    assert_eq!(ok.total_tokens, 107);

    let seen = model.seen.lock().unwrap();
    assert!(seen.iter().all(|r| r.temperature.is_none()));
    assert!(seen[0].user.starts_with("Context:\n### FILE: a_notes.txt\n"));
    assert!(seen[0].user.ends_with("\n\nQuestion:\nWhat are the exit criteria?"));
    assert!(seen[0].system.contains(REFUSAL));

    let csv = fs::read_to_string(dir.path().join("result.csv")).unwrap();
    assert_eq!(csv.lines().count(), 7);
    assert!(csv.starts_with("model,question,latency_s,input_tokens,output_tokens,total_tokens,answer_preview\n"));
}

#[test]
fn unreadable_file_is_skipped() {
    let dir = TempDir::new().unwrap();
    let policy = KeyPreference::standard().unwrap();
    let missing = dir.path().join("gone.txt");
    assert!(read_document(&missing, &policy, ParseFallback::RawText).is_none());

    seed(&dir);
    let notes = read_document(&dir.path().join("data").join("a_notes.txt"), &policy, ParseFallback::RawText).unwrap();
    assert_eq!(notes.filename, "a_notes.txt");
}
