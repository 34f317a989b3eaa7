//! Configuration loader and path helpers.
//!
//! Uses Figment to merge built-in defaults + `policyqa.toml` +
//! `policyqa.<env>.toml` + `APP_*` env vars (`__` nests, e.g.
//! `APP_RETRIEVAL__TOP_K`) + `OPENAI_API_KEY`.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::error::PipelineError;

pub const DEFAULT_TOP_K: usize = 6;
pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 12_000;
pub const DEFAULT_MIN_CONTEXT_CHARS: usize = 200;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file("policyqa.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("policyqa.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("policyqa.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("policyqa.test.toml")),
            _ => {}
        }
        figment = figment
            .merge(Env::prefixed("APP_").split("__"))
            .merge(Env::raw().only(&["OPENAI_API_KEY"]).map(|_| "llm.api_key".into()));

        Ok(Self { figment })
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// The whole typed configuration, validated.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| PipelineError::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub index: IndexSettings,
    pub retrieval: RetrievalSettings,
    pub embedding: EmbeddingSettings,
    pub llm: LlmSettings,
    pub bench: BenchSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.retrieval.top_k == 0 {
            return Err(PipelineError::InvalidConfig("retrieval.top_k must be >= 1".into()));
        }
        if self.bench.max_context_chars <= self.bench.min_context_chars {
            return Err(PipelineError::InvalidConfig(format!(
                "bench.max_context_chars ({}) must exceed bench.min_context_chars ({})",
                self.bench.max_context_chars, self.bench.min_context_chars
            )));
        }
        Ok(())
    }

    /// The API credential, or the fatal precondition error when absent.
    pub fn require_api_key(&self) -> Result<&str, PipelineError> {
        match self.llm.api_key.as_deref().map(str::trim) {
            Some(k) if !k.is_empty() => Ok(k),
            _ => Err(PipelineError::MissingCredential("OPENAI_API_KEY not set".into())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    pub path: String,
    pub table: String,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self { path: "./vector_db".to_string(), table: "Implementation_Phase".to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub top_k: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self { Self { top_k: DEFAULT_TOP_K } }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Directory holding `config.json`, `tokenizer.json` and the weights.
    pub model_dir: Option<String>,
    pub max_len: usize,
    pub fake: bool,
    pub fake_dim: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self { model_dir: None, max_len: 256, fake: false, fake_dim: 384 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub model: String,
    pub api_base: String,
    pub api_key: Option<String>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            api_base: "https://api.openai.com/v1".to_string(),
            api_key: None,
        }
    }
}

/// What to do with a structured corpus file that fails to parse.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ParseFallback {
    #[default]
    RawText,
    Skip,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchSettings {
    pub data_dir: String,
    pub out_file: String,
    pub max_context_chars: usize,
    pub min_context_chars: usize,
    pub parse_fallback: ParseFallback,
    pub models: Vec<String>,
    pub questions: Vec<String>,
}

impl Default for BenchSettings {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            out_file: "result.csv".to_string(),
            max_context_chars: DEFAULT_MAX_CONTEXT_CHARS,
            min_context_chars: DEFAULT_MIN_CONTEXT_CHARS,
            parse_fallback: ParseFallback::RawText,
            models: vec!["gpt-5-nano".into(), "gpt-4o-mini".into(), "gpt-4o".into()],
            questions: vec![
                "List key deliverables in the Development Phase and briefly describe each.".into(),
                "What are the responsibilities of the Project Manager during Development?".into(),
                "What are the exit criteria for the Development Phase?".into(),
            ],
        }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}
