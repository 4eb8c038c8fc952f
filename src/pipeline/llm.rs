//! Chat-model seam shared by the summarizer, the vision OCR backend and the
//! answer generator.
//!
//! Pipeline stages depend on the narrow [`ChatModel`] trait rather than on
//! `edgequake_llm::LLMProvider` directly. [`ProviderChatModel`] adapts any
//! edgequake-llm provider (OpenAI, Anthropic, Gemini, Ollama, …) and tests
//! substitute a scripted model.

use crate::config::RagConfig;
use crate::error::{LlmError, PdfRagError};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Speaker of a prompt message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
}

/// One role-tagged message, optionally carrying images.
pub struct PromptMessage {
    pub role: Role,
    pub content: String,
    pub images: Vec<ImageData>,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            images: Vec::new(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            images: Vec::new(),
        }
    }

    pub fn user_with_images(content: impl Into<String>, images: Vec<ImageData>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            images,
        }
    }
}

/// Sampling parameters for one completion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub max_tokens: usize,
}

/// A remote (or fake) chat-completion endpoint.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send an ordered list of messages and return the reply text.
    async fn chat(
        &self,
        messages: &[PromptMessage],
        options: &GenerationOptions,
    ) -> Result<String, LlmError>;
}

/// [`ChatModel`] backed by an edgequake-llm provider.
pub struct ProviderChatModel {
    provider: Arc<dyn LLMProvider>,
}

impl ProviderChatModel {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl ChatModel for ProviderChatModel {
    async fn chat(
        &self,
        messages: &[PromptMessage],
        options: &GenerationOptions,
    ) -> Result<String, LlmError> {
        let start = Instant::now();
        let chat_messages: Vec<ChatMessage> = messages.iter().map(to_chat_message).collect();
        let completion = build_options(options);

        let response = self
            .provider
            .chat(&chat_messages, Some(&completion))
            .await
            .map_err(|e| LlmError::Api(e.to_string()))?;

        debug!(
            "Chat completion: {} input tokens, {} output tokens, {:?}",
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );

        if response.content.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(response.content)
    }
}

fn to_chat_message(m: &PromptMessage) -> ChatMessage {
    match m.role {
        Role::System => ChatMessage::system(m.content.as_str()),
        Role::User if m.images.is_empty() => ChatMessage::user(m.content.as_str()),
        Role::User => ChatMessage::user_with_images(m.content.as_str(), m.images.clone()),
    }
}

/// Build `CompletionOptions` from generation options.
fn build_options(options: &GenerationOptions) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(options.temperature),
        max_tokens: Some(options.max_tokens),
        ..Default::default()
    }
}

/// Resolve the chat provider, from most-specific to least-specific.
///
/// 1. A pre-built provider in the config.
/// 2. `provider_name` + `model` from the config.
/// 3. `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL` when both are set.
/// 4. OpenAI when `OPENAI_API_KEY` is present.
/// 5. Full auto-detection via `ProviderFactory::from_env`.
pub fn resolve_provider(config: &RagConfig) -> Result<Arc<dyn LLMProvider>, PdfRagError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
            return create_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| PdfRagError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

/// Default chat model; it is vision-capable so the same provider serves OCR.
pub const DEFAULT_MODEL: &str = "gpt-4.1-nano";

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, PdfRagError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        PdfRagError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_options_carries_sampling() {
        let opts = build_options(&GenerationOptions {
            temperature: 0.0,
            max_tokens: 1024,
        });
        assert_eq!(opts.temperature, Some(0.0));
        assert_eq!(opts.max_tokens, Some(1024));
    }

    #[test]
    fn prompt_message_constructors() {
        let s = PromptMessage::system("rules");
        assert_eq!(s.role, Role::System);
        assert!(s.images.is_empty());

        let u = PromptMessage::user("question");
        assert_eq!(u.role, Role::User);
        assert_eq!(u.content, "question");
    }
}
