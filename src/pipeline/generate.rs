//! Answer generation from retrieved context.
//!
//! Errors propagate: an empty retrieval result is
//! [`PdfRagError::NoRelevantContext`] (checked before any model call), and a
//! failed completion is [`PdfRagError::LlmApiError`]. Nothing is retried.

use crate::error::PdfRagError;
use crate::pipeline::llm::{ChatModel, GenerationOptions, PromptMessage};
use crate::pipeline::store::ScoredChunk;
use crate::prompts::{answer_user_prompt, ANSWER_SYSTEM_PROMPT};
use std::sync::Arc;
use tracing::info;

/// Separates chunks when more than one is retrieved.
const CONTEXT_SEPARATOR: &str = "\n\n";

pub struct AnswerGenerator {
    chat: Arc<dyn ChatModel>,
    options: GenerationOptions,
}

impl AnswerGenerator {
    pub fn new(chat: Arc<dyn ChatModel>, temperature: f32, max_tokens: usize) -> Self {
        Self {
            chat,
            options: GenerationOptions {
                temperature,
                max_tokens,
            },
        }
    }

    /// Answer `question` from the retrieved chunks; the reply is returned verbatim.
    pub async fn generate(
        &self,
        question: &str,
        retrieved: &[ScoredChunk],
    ) -> Result<String, PdfRagError> {
        if retrieved.is_empty() {
            return Err(PdfRagError::NoRelevantContext {
                query: question.to_string(),
            });
        }

        let context = build_context(retrieved);
        let messages = [
            PromptMessage::system(ANSWER_SYSTEM_PROMPT),
            PromptMessage::user(answer_user_prompt(&context, question)),
        ];

        let answer = self.chat.chat(&messages, &self.options).await?;
        info!("Generated answer: {} chars", answer.len());
        Ok(answer)
    }
}

/// Concatenate retrieved chunk texts, best match first.
pub fn build_context(retrieved: &[ScoredChunk]) -> String {
    retrieved
        .iter()
        .map(|s| s.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}
