//! Configuration types for a PDF question-answering run.
//!
//! All pipeline behaviour is controlled through [`RagConfig`], built via its
//! [`RagConfigBuilder`]. Every stage reads its knobs from this one struct, so
//! two runs can be compared by diffing their configs.

use crate::error::PdfRagError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration for a PDF question-answering run.
///
/// Built via [`RagConfig::builder()`] or using [`RagConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_pdf_rag::{OcrBackend, RagConfig};
///
/// let config = RagConfig::builder()
///     .chunk_size(400)
///     .chunk_overlap(50)
///     .top_k(1)
///     .ocr_backend(OcrBackend::Tesseract)
///     .build()
///     .unwrap();
/// assert_eq!(config.chunk_size, 400);
/// ```
#[derive(Clone)]
pub struct RagConfig {
    /// Maximum rendered image dimension (width or height) in pixels. Default: 2000.
    ///
    /// Caps either dimension and scales the other proportionally, so a
    /// poster-sized page never allocates an unbounded bitmap.
    pub max_rendered_pixels: u32,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Directory receiving one `page_{n}.png` per rasterised page. Default: `.`.
    pub image_dir: PathBuf,

    /// Maximum characters per chunk. Default: 400.
    pub chunk_size: usize,

    /// Characters shared by consecutive chunks. Default: 50. Must be < `chunk_size`.
    pub chunk_overlap: usize,

    /// Number of chunks handed to the answer generator. Default: 1.
    pub top_k: usize,

    /// Characters of OCR text included in a page summary prompt. Default: 500.
    pub summary_excerpt_chars: usize,

    /// Name of the in-memory vector collection. Default: `"pdf_chunks"`.
    pub collection_name: String,

    /// Chat model identifier, e.g. "gpt-4.1-nano". If None, uses provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `provider`, the provider is auto-detected from the environment.
    pub provider_name: Option<String>,

    /// Pre-constructed chat provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for page summaries. Default: 0.7.
    pub summary_temperature: f32,

    /// Sampling temperature for the final answer. Default: 0.0 (deterministic).
    pub answer_temperature: f32,

    /// Maximum tokens per chat completion. Default: 1024.
    pub max_tokens: usize,

    /// Which OCR engine reads the rendered pages. Default: [`OcrBackend::Tesseract`].
    pub ocr_backend: OcrBackend,

    /// Tesseract language code. Default: `"eng"`.
    pub ocr_language: String,

    /// Which embedding backend indexes the chunks. Default: [`EmbeddingBackend::Provider`].
    pub embedding_backend: EmbeddingBackend,

    /// Run the OCR + summary pass over every page before indexing. Default: false.
    pub summarize_pages: bool,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional progress observer.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            max_rendered_pixels: 2000,
            password: None,
            image_dir: PathBuf::from("."),
            chunk_size: 400,
            chunk_overlap: 50,
            top_k: 1,
            summary_excerpt_chars: 500,
            collection_name: "pdf_chunks".to_string(),
            model: None,
            provider_name: None,
            provider: None,
            summary_temperature: 0.7,
            answer_temperature: 0.0,
            max_tokens: 1024,
            ocr_backend: OcrBackend::default(),
            ocr_language: "eng".to_string(),
            embedding_backend: EmbeddingBackend::default(),
            summarize_pages: false,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for RagConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RagConfig")
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("image_dir", &self.image_dir)
            .field("chunk_size", &self.chunk_size)
            .field("chunk_overlap", &self.chunk_overlap)
            .field("top_k", &self.top_k)
            .field("summary_excerpt_chars", &self.summary_excerpt_chars)
            .field("collection_name", &self.collection_name)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("summary_temperature", &self.summary_temperature)
            .field("answer_temperature", &self.answer_temperature)
            .field("max_tokens", &self.max_tokens)
            .field("ocr_backend", &self.ocr_backend)
            .field("ocr_language", &self.ocr_language)
            .field("embedding_backend", &self.embedding_backend)
            .field("summarize_pages", &self.summarize_pages)
            .finish()
    }
}

impl RagConfig {
    /// Create a new builder for `RagConfig`.
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`RagConfig`].
#[derive(Debug)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn image_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.image_dir = dir.into();
        self
    }

    pub fn chunk_size(mut self, n: usize) -> Self {
        self.config.chunk_size = n;
        self
    }

    pub fn chunk_overlap(mut self, n: usize) -> Self {
        self.config.chunk_overlap = n;
        self
    }

    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    pub fn summary_excerpt_chars(mut self, n: usize) -> Self {
        self.config.summary_excerpt_chars = n;
        self
    }

    pub fn collection_name(mut self, name: impl Into<String>) -> Self {
        self.config.collection_name = name.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn summary_temperature(mut self, t: f32) -> Self {
        self.config.summary_temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn answer_temperature(mut self, t: f32) -> Self {
        self.config.answer_temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn ocr_backend(mut self, backend: OcrBackend) -> Self {
        self.config.ocr_backend = backend;
        self
    }

    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr_language = lang.into();
        self
    }

    pub fn embedding_backend(mut self, backend: EmbeddingBackend) -> Self {
        self.config.embedding_backend = backend;
        self
    }

    pub fn summarize_pages(mut self, v: bool) -> Self {
        self.config.summarize_pages = v;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RagConfig, PdfRagError> {
        let c = &self.config;
        if c.chunk_size == 0 {
            return Err(PdfRagError::InvalidConfig(
                "Chunk size must be ≥ 1".into(),
            ));
        }
        if c.chunk_overlap >= c.chunk_size {
            return Err(PdfRagError::InvalidConfig(format!(
                "Chunk overlap ({}) must be smaller than chunk size ({})",
                c.chunk_overlap, c.chunk_size
            )));
        }
        if c.top_k == 0 {
            return Err(PdfRagError::InvalidConfig("top_k must be ≥ 1".into()));
        }
        if let EmbeddingBackend::Hashing { dimension: 0 } = c.embedding_backend {
            return Err(PdfRagError::InvalidConfig(
                "Hashing embedder dimension must be ≥ 1".into(),
            ));
        }
        if c.collection_name.trim().is_empty() {
            return Err(PdfRagError::InvalidConfig(
                "Collection name must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// OCR engine used to read rasterised pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OcrBackend {
    /// Local `tesseract` executable. (default)
    #[default]
    Tesseract,
    /// The configured chat provider reads the page image (needs a vision model).
    Vision,
}

/// Source of chunk and query embeddings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EmbeddingBackend {
    /// Embedding provider auto-detected from the environment. (default)
    #[default]
    Provider,
    /// Local feature-hashing embedder; no network, lexical similarity only.
    Hashing { dimension: usize },
}
