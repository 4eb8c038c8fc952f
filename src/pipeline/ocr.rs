//! OCR: recover text from a saved page image.
//!
//! Engines implement [`OcrEngine`] and report failures as [`OcrError`].
//! Pipeline code calls [`ocr_page`], which applies the sentinel policy: a
//! failed or blank recognition is logged and becomes `None`, and the caller
//! skips summarisation for that page.
//!
//! Two engines ship with the crate:
//!
//! * [`TesseractOcr`] — runs the `tesseract` executable per image.
//! * [`VisionOcr`] — asks a vision-capable [`ChatModel`] to transcribe the page.

use crate::config::{OcrBackend, RagConfig};
use crate::error::OcrError;
use crate::pipeline::encode::encode_file;
use crate::pipeline::llm::{ChatModel, GenerationOptions, PromptMessage};
use crate::prompts::VISION_OCR_PROMPT;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Recognises text in a single page image.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Short engine name for logs.
    fn name(&self) -> &str;

    /// Recognise the text of the image at `image_path`.
    async fn recognize(&self, image_path: &Path) -> Result<String, OcrError>;
}

/// Run OCR and collapse failure into `None`.
///
/// Blank output counts as failure: there is nothing to summarise.
pub async fn ocr_page(engine: &dyn OcrEngine, image_path: &Path) -> Option<String> {
    match engine.recognize(image_path).await {
        Ok(text) if !text.trim().is_empty() => {
            debug!(
                "{}: {} chars from {}",
                engine.name(),
                text.len(),
                image_path.display()
            );
            Some(text)
        }
        Ok(_) => {
            warn!(
                "{}: no text recognised in {}",
                engine.name(),
                image_path.display()
            );
            None
        }
        Err(e) => {
            error!("Error extracting text from image: {}", e);
            None
        }
    }
}

/// Build the engine selected by the config.
///
/// `chat` is only used by [`OcrBackend::Vision`].
pub fn build_ocr_engine(config: &RagConfig, chat: Arc<dyn ChatModel>) -> Arc<dyn OcrEngine> {
    match config.ocr_backend {
        OcrBackend::Tesseract => Arc::new(TesseractOcr::new(config.ocr_language.clone())),
        OcrBackend::Vision => Arc::new(VisionOcr::new(chat, config.max_tokens)),
    }
}

// ── Tesseract ────────────────────────────────────────────────────────────────

/// OCR through the `tesseract` command-line tool.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    language: String,
    binary: String,
}

impl TesseractOcr {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            binary: "tesseract".to_string(),
        }
    }

    /// Use a tesseract executable other than the one on `PATH`.
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    fn name(&self) -> &str {
        "tesseract"
    }

    async fn recognize(&self, image_path: &Path) -> Result<String, OcrError> {
        if !image_path.exists() {
            return Err(OcrError::UnreadableImage {
                path: image_path.to_path_buf(),
                detail: "file does not exist".to_string(),
            });
        }

        let output = tokio::process::Command::new(&self.binary)
            .arg(image_path)
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .output()
            .await
            .map_err(|e| OcrError::Unavailable {
                engine: self.binary.clone(),
                detail: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(OcrError::EngineFailed {
                engine: self.binary.clone(),
                path: image_path.to_path_buf(),
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

// ── Vision model ─────────────────────────────────────────────────────────────

/// OCR by a vision-capable chat model.
pub struct VisionOcr {
    chat: Arc<dyn ChatModel>,
    max_tokens: usize,
}

impl VisionOcr {
    pub fn new(chat: Arc<dyn ChatModel>, max_tokens: usize) -> Self {
        Self { chat, max_tokens }
    }
}

#[async_trait]
impl OcrEngine for VisionOcr {
    fn name(&self) -> &str {
        "vision"
    }

    async fn recognize(&self, image_path: &Path) -> Result<String, OcrError> {
        let image = encode_file(image_path).map_err(|e| OcrError::UnreadableImage {
            path: image_path.to_path_buf(),
            detail: e.to_string(),
        })?;

        let messages = [
            PromptMessage::system(VISION_OCR_PROMPT),
            PromptMessage::user_with_images("", vec![image]),
        ];
        // Transcription should be faithful, never creative.
        let options = GenerationOptions {
            temperature: 0.0,
            max_tokens: self.max_tokens,
        };

        self.chat
            .chat(&messages, &options)
            .await
            .map_err(|e| OcrError::EngineFailed {
                engine: "vision".to_string(),
                path: image_path.to_path_buf(),
                detail: e.to_string(),
            })
    }
}
