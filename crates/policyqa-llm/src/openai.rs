use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use policyqa_core::traits::{Completion, CompletionRequest, LanguageModel};

use crate::error::LlmError;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Blocking client for `POST {base}/chat/completions`.
pub struct OpenAiClient {
    api_key: String,
    client: Client,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: &str) -> Result<Self, LlmError> {
        Self::with_base_url(api_key, DEFAULT_API_BASE)
    }

    pub fn with_base_url(api_key: &str, base_url: &str) -> Result<Self, LlmError> {
        if api_key.trim().is_empty() {
            return Err(LlmError::Config("API key is required".to_string()));
        }
        Ok(Self {
            api_key: api_key.to_string(),
            client: Client::builder().build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn chat(&self, request: &CompletionRequest) -> Result<Completion, LlmError> {
        let body = ChatRequest {
            model: &request.model,
            messages: [
                ChatMessage { role: "system", content: &request.system },
                ChatMessage { role: "user", content: &request.user },
            ],
            temperature: request.temperature,
        };
        debug!(model = %request.model, "sending chat request");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                error!(error = %e, "chat request failed");
                LlmError::from(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            error!(status = status.as_u16(), "chat API error");
            return Err(LlmError::Api { status: status.as_u16(), body });
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| LlmError::Malformed(e.to_string()))?;
        convert_response(parsed)
    }
}

fn convert_response(response: ChatResponse) -> Result<Completion, LlmError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::Malformed("no choices in response".to_string()))?;
    let usage = response.usage.unwrap_or_default();
    Ok(Completion {
        text: choice.message.content.unwrap_or_default(),
        input_tokens: usage.prompt_tokens,
        output_tokens: usage.completion_tokens,
        total_tokens: usage.total_tokens,
    })
}

impl LanguageModel for OpenAiClient {
    fn complete(&self, request: &CompletionRequest) -> anyhow::Result<Completion> {
        Ok(self.chat(request)?)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
    #[serde(default)]
    total_tokens: u64,
}
