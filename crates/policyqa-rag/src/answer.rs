use policyqa_core::traits::{CompletionRequest, LanguageModel};
use policyqa_core::types::{GroundedAnswer, PassageId, REFUSAL};

use crate::prompt::Prompt;

/// Turns a grounded prompt into an answer. Never fails: model errors come back
/// as answer text.
pub struct AnswerService<M> where M: LanguageModel {
    model: M,
    model_name: String,
}

impl<M> AnswerService<M> where M: LanguageModel {
    pub fn new(model: M, model_name: impl Into<String>) -> Self {
        Self { model, model_name: model_name.into() }
    }

    pub fn model_name(&self) -> &str { &self.model_name }

    pub fn answer(&self, prompt: &Prompt, citation_ids: Vec<PassageId>) -> GroundedAnswer {
        if citation_ids.is_empty() {
            tracing::debug!("no supporting passages; refusing without a model call");
            return GroundedAnswer::refusal();
        }
        let request = CompletionRequest {
            model: self.model_name.clone(),
            system: prompt.system.clone(),
            user: prompt.user.clone(),
            temperature: Some(0.0),
        };
        match self.model.complete(&request) {
            Ok(c) => {
                let text = c.text.trim();
                if text.is_empty() {
                    return GroundedAnswer::cited(REFUSAL, citation_ids);
                }
                tracing::debug!(model = %self.model_name, total_tokens = c.total_tokens, "answered");
                GroundedAnswer::cited(text, citation_ids)
            }
            Err(e) => {
                tracing::warn!(model = %self.model_name, error = %e, "language model call failed");
                GroundedAnswer::cited(format!("[llm error] {e}"), citation_ids)
            }
        }
    }
}
