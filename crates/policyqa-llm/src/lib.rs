//! OpenAI-compatible chat-completions client implementing `LanguageModel`.

mod error;
mod openai;

pub use error::LlmError;
pub use openai::{OpenAiClient, DEFAULT_API_BASE};
