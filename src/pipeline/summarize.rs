//! Page summaries: image details + OCR excerpt → short description.
//!
//! Failure policy is swallow-and-substitute. [`PageSummarizer::summarize`]
//! always returns a string: the model's reply, the fixed
//! [`NO_TEXT_TO_SUMMARIZE`] message when there is no text (no model call is
//! made), or the fixed [`SUMMARY_ERROR`] message when anything fails.

use crate::config::RagConfig;
use crate::error::LlmError;
use crate::pipeline::llm::{ChatModel, GenerationOptions, PromptMessage};
use crate::pipeline::render::{ImageDetails, PageImage};
use crate::prompts::{
    excerpt, summary_user_prompt, NO_TEXT_TO_SUMMARIZE, SUMMARY_ERROR, SUMMARY_SYSTEM_PROMPT,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error};

/// Summarises one page at a time through a [`ChatModel`].
pub struct PageSummarizer {
    chat: Arc<dyn ChatModel>,
    excerpt_chars: usize,
    options: GenerationOptions,
}

impl PageSummarizer {
    pub fn new(chat: Arc<dyn ChatModel>, config: &RagConfig) -> Self {
        Self {
            chat,
            excerpt_chars: config.summary_excerpt_chars,
            options: GenerationOptions {
                temperature: config.summary_temperature,
                max_tokens: config.max_tokens,
            },
        }
    }

    /// Summarise the image at `image_path` from its OCR text.
    ///
    /// Image details are read from the file.
    pub async fn summarize(&self, image_path: &Path, text: Option<&str>) -> String {
        let Some(text) = non_blank(text) else {
            return NO_TEXT_TO_SUMMARIZE.to_string();
        };

        match ImageDetails::read(image_path) {
            Ok(details) => self.summarize_with(&details, image_path, text).await,
            Err(e) => {
                error!("Error reading image details for {}: {}", image_path.display(), e);
                SUMMARY_ERROR.to_string()
            }
        }
    }

    /// Summarise a rendered page using the details recorded at render time.
    pub async fn summarize_page(&self, page: &PageImage, text: Option<&str>) -> String {
        let Some(text) = non_blank(text) else {
            return NO_TEXT_TO_SUMMARIZE.to_string();
        };
        self.summarize_with(&page.details, &page.path, text).await
    }

    async fn summarize_with(&self, details: &ImageDetails, image_path: &Path, text: &str) -> String {
        match self.request(details, image_path, text).await {
            Ok(summary) => summary,
            Err(e) => {
                error!("Error generating summary for {}: {}", image_path.display(), e);
                SUMMARY_ERROR.to_string()
            }
        }
    }

    async fn request(
        &self,
        details: &ImageDetails,
        image_path: &Path,
        text: &str,
    ) -> Result<String, LlmError> {
        let prompt = summary_user_prompt(
            &details.format,
            details.width,
            details.height,
            &details.mode,
            excerpt(text, self.excerpt_chars),
        );
        debug!("Summary prompt for {}: {} chars", image_path.display(), prompt.len());

        let messages = [
            PromptMessage::system(SUMMARY_SYSTEM_PROMPT),
            PromptMessage::user(prompt),
        ];
        let reply = self.chat.chat(&messages, &self.options).await?;
        Ok(reply.trim().to_string())
    }
}

fn non_blank(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingChat {
        prompts: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl ChatModel for RecordingChat {
        async fn chat(
            &self,
            messages: &[PromptMessage],
            _options: &GenerationOptions,
        ) -> Result<String, LlmError> {
            let user = messages.last().map(|m| m.content.clone()).unwrap_or_default();
            self.prompts.lock().unwrap().push(user);
            if self.fail {
                Err(LlmError::Api("503 Service Unavailable".into()))
            } else {
                Ok("  The page introduces the Transformer.  ".into())
            }
        }
    }

    fn summarizer(chat: Arc<RecordingChat>) -> PageSummarizer {
        PageSummarizer::new(chat, &RagConfig::default())
    }

    fn write_png(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("page_1.png");
        image::RgbImage::from_pixel(30, 20, image::Rgb([255, 255, 255]))
            .save(&path)
            .unwrap();
        path
    }

    #[tokio::test]
    async fn empty_text_skips_model() {
        let chat = Arc::new(RecordingChat::default());
        let s = summarizer(chat.clone());

        assert_eq!(s.summarize(Path::new("page_1.png"), None).await, NO_TEXT_TO_SUMMARIZE);
        assert_eq!(s.summarize(Path::new("page_1.png"), Some("")).await, NO_TEXT_TO_SUMMARIZE);
        assert!(chat.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn prompt_carries_details_and_first_500_chars() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path());
        let chat = Arc::new(RecordingChat::default());
        let s = summarizer(chat.clone());

        let text = format!("{}{}", "a".repeat(500), "TAIL");
        let summary = s.summarize(&path, Some(&text)).await;
        assert_eq!(summary, "The page introduces the Transformer.");

        let prompts = chat.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Format: PNG"));
        assert!(prompts[0].contains("(30, 20)"));
        assert!(prompts[0].contains("Mode: RGB"));
        assert!(prompts[0].contains(&"a".repeat(500)));
        assert!(!prompts[0].contains("TAIL"));
    }

    #[tokio::test]
    async fn model_error_is_substituted() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path());
        let chat = Arc::new(RecordingChat {
            fail: true,
            ..Default::default()
        });
        let s = summarizer(chat);
        assert_eq!(s.summarize(&path, Some("some text")).await, SUMMARY_ERROR);
    }

    #[tokio::test]
    async fn unreadable_image_is_substituted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page_9.png");
        std::fs::write(&path, b"nope").unwrap();
        let chat = Arc::new(RecordingChat::default());
        let s = summarizer(chat.clone());

        assert_eq!(s.summarize(&path, Some("text")).await, SUMMARY_ERROR);
        assert!(chat.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn rendered_page_details_are_used_without_reading_the_file() {
        let chat = Arc::new(RecordingChat::default());
        let s = summarizer(chat.clone());
        let page = PageImage {
            page_num: 4,
            path: PathBuf::from("never-written/page_4.png"),
            details: ImageDetails {
                format: "PNG".into(),
                width: 1414,
                height: 2000,
                mode: "RGBA".into(),
            },
        };

        let summary = s.summarize_page(&page, Some("Scaled dot-product attention.")).await;
        assert_eq!(summary, "The page introduces the Transformer.");

        let prompts = chat.prompts.lock().unwrap();
        assert!(prompts[0].contains("Size: (1414, 2000)"));
        assert!(prompts[0].contains("Mode: RGBA"));
        assert!(prompts[0].contains("Scaled dot-product attention."));
    }

    #[tokio::test]
    async fn rendered_page_without_text_skips_model() {
        let chat = Arc::new(RecordingChat::default());
        let s = summarizer(chat.clone());
        let page = PageImage {
            page_num: 1,
            path: PathBuf::from("page_1.png"),
            details: ImageDetails {
                format: "PNG".into(),
                width: 1,
                height: 1,
                mode: "L".into(),
            },
        };
        assert_eq!(s.summarize_page(&page, Some("  ")).await, NO_TEXT_TO_SUMMARIZE);
        assert!(chat.prompts.lock().unwrap().is_empty());
    }
}
