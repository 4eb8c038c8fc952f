//! # edgequake-pdf-rag
//!
//! Ask questions about a PDF document and get answers grounded in its text.
//!
//! The text layer is split into overlapping chunks, embedded and indexed in
//! an in-memory vector store; a question retrieves the most similar chunk and
//! a chat model answers from it. An optional pass renders every page to a
//! PNG, OCRs it and produces a short per-page summary for a human to browse.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input     resolve local file or download from URL
//!  ├─ 2. Extract   text layer via pdfium (spawn_blocking)
//!  ├─ 3. Summary   rasterise → OCR → summarise → display  (optional, per page)
//!  ├─ 4. Index     400-char chunks, 50 overlap → embeddings → vector store
//!  ├─ 5. Retrieve  top-k cosine similarity
//!  └─ 6. Answer    chat model, temperature 0
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdf_rag::{RagConfig, RagPipeline};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
//!     let config = RagConfig::default();
//!     let mut pipeline = RagPipeline::from_config(config)?;
//!     let report = pipeline
//!         .run(
//!             "attention_is_all_you_need.pdf",
//!             Some("What is the BLEU score of the Transformer (base model)?"),
//!             &mut [],
//!         )
//!         .await?;
//!     if let Some(answer) = report.answer {
//!         println!("{}", answer.answer);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfrag` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! ## Swapping backends
//!
//! Every stage that talks to something external sits behind a trait:
//! [`ChatModel`], [`Embedder`], [`VectorStore`], [`OcrEngine`] and
//! [`DisplaySink`]. [`RagPipeline::with_components`] accepts any mix of
//! implementations; [`RagPipeline::from_config`] picks them from
//! [`RagConfig`].

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod rag;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{EmbeddingBackend, OcrBackend, RagConfig, RagConfigBuilder};
pub use error::{LlmError, OcrError, PdfRagError};
pub use output::{Answer, DocumentMetadata, PageOutcome, PageSummary, RunReport, RunStats};
pub use pipeline::chunk::{Chunk, TextSplitter};
pub use pipeline::display::{ConsoleSink, DisplaySink, MarkdownReportSink};
pub use pipeline::embed::{Embedder, HashingEmbedder, ProviderEmbedder};
pub use pipeline::input::acquire;
pub use pipeline::llm::{ChatModel, GenerationOptions, PromptMessage, ProviderChatModel, Role};
pub use pipeline::ocr::{OcrEngine, TesseractOcr, VisionOcr};
pub use pipeline::store::{InMemoryVectorStore, ScoredChunk, VectorStore};
pub use progress::{NoopProgressCallback, PipelineProgressCallback, ProgressCallback};
pub use rag::{ask, inspect, RagPipeline};
