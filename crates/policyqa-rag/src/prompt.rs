use policyqa_core::types::{RetrievalResult, REFUSAL};

pub const PASSAGE_SEPARATOR: &str = "\n\n---\n\n";

/// System instruction plus user content, ready for a chat call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Builds grounded prompts. Passages go in as received: no re-ranking, no dedup.
#[derive(Debug, Clone)]
pub struct PromptComposer {
    system: String,
}

impl PromptComposer {
    /// Grounding contract for retrieval-backed answers.
    pub fn interactive() -> Self {
        Self {
            system: format!(
                "You are an EPLC assistant. Answer only using the information in the CONTEXT. \
                 If the answer can be inferred from the context, explain it briefly. \
                 If the context provides no relevant information, reply exactly: {REFUSAL}"
            ),
        }
    }

    /// Same refusal contract, worded for a whole-corpus context.
    pub fn benchmark() -> Self {
        Self {
            system: format!(
                "You are an EPLC assistant. Answer strictly based on the provided context. \
                 If information is missing, reply exactly: '{REFUSAL}' \
                 Return clear and structured text."
            ),
        }
    }

    pub fn system(&self) -> &str { &self.system }

    pub fn compose(&self, question: &str, passages: &[RetrievalResult]) -> Prompt {
        let context = passages.iter().map(|p| p.text.as_str()).collect::<Vec<_>>().join(PASSAGE_SEPARATOR);
        Prompt {
            system: self.system.clone(),
            user: format!("CONTEXT:\n{context}\n\nQUESTION:\n{question}\n"),
        }
    }

    /// Prompt over a pre-assembled context block.
    pub fn compose_with_context(&self, question: &str, context: &str) -> Prompt {
        Prompt {
            system: self.system.clone(),
            user: format!("Context:\n{context}\n\nQuestion:\n{question}"),
        }
    }
}
