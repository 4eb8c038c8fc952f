//! The pipeline: sequencing of the stages in [`crate::pipeline`].
//!
//! ```text
//! acquire ─▶ extract ──────────────────────────────▶ chunk ─▶ embed/index ─▶ retrieve ─▶ generate
//!        └─▶ rasterize ─▶ (OCR ─▶ summarize ─▶ display) per page
//! ```
//!
//! [`RagPipeline`] holds one implementation of every capability and runs
//! them strictly in order, one page at a time. Each stage keeps its own
//! failure policy:
//!
//! | Stage | Policy |
//! |-------|--------|
//! | rasterize | fail-fast-to-empty |
//! | OCR | `None` sentinel, page skipped |
//! | summarize | fixed substitute message |
//! | display | logged, run continues |
//! | extract / index / retrieve / generate | `Err(PdfRagError)` |

use crate::config::{EmbeddingBackend, RagConfig};
use crate::error::PdfRagError;
use crate::output::{Answer, DocumentMetadata, PageOutcome, PageSummary, RunReport, RunStats};
use crate::pipeline::chunk::TextSplitter;
use crate::pipeline::display::DisplaySink;
use crate::pipeline::embed::{Embedder, HashingEmbedder, ProviderEmbedder};
use crate::pipeline::generate::AnswerGenerator;
use crate::pipeline::llm::{resolve_provider, ChatModel, ProviderChatModel};
use crate::pipeline::ocr::{build_ocr_engine, ocr_page, OcrEngine};
use crate::pipeline::render::{self, PageImage};
use crate::pipeline::retrieve::Retriever;
use crate::pipeline::store::{InMemoryVectorStore, VectorStore};
use crate::pipeline::summarize::PageSummarizer;
use crate::pipeline::{extract, input};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// A configured pipeline with one backend per capability.
pub struct RagPipeline {
    config: RagConfig,
    ocr: Arc<dyn OcrEngine>,
    summarizer: PageSummarizer,
    generator: AnswerGenerator,
    retriever: Retriever,
    splitter: TextSplitter,
}

impl RagPipeline {
    /// Build every backend from the config and environment.
    pub fn from_config(config: RagConfig) -> Result<Self, PdfRagError> {
        let provider = resolve_provider(&config)?;
        let chat: Arc<dyn ChatModel> = Arc::new(ProviderChatModel::new(provider));

        let embedder: Arc<dyn Embedder> = match config.embedding_backend {
            EmbeddingBackend::Provider => Arc::new(ProviderEmbedder::from_env()?),
            EmbeddingBackend::Hashing { dimension } => Arc::new(HashingEmbedder::new(dimension)),
        };

        let ocr = build_ocr_engine(&config, Arc::clone(&chat));
        let store = Box::new(InMemoryVectorStore::new(config.collection_name.clone()));
        Ok(Self::with_components(config, chat, embedder, store, ocr))
    }

    /// Assemble a pipeline from explicit backends.
    pub fn with_components(
        config: RagConfig,
        chat: Arc<dyn ChatModel>,
        embedder: Arc<dyn Embedder>,
        store: Box<dyn VectorStore>,
        ocr: Arc<dyn OcrEngine>,
    ) -> Self {
        let summarizer = PageSummarizer::new(Arc::clone(&chat), &config);
        let generator =
            AnswerGenerator::new(Arc::clone(&chat), config.answer_temperature, config.max_tokens);
        let splitter = TextSplitter::new(config.chunk_size, config.chunk_overlap);
        Self {
            ocr,
            summarizer,
            generator,
            retriever: Retriever::new(embedder, store),
            splitter,
            config,
        }
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Number of chunks currently indexed.
    pub fn indexed_chunks(&self) -> usize {
        self.retriever.len()
    }

    // ── Summary pass ─────────────────────────────────────────────────────

    /// Rasterise the PDF, then OCR and summarise every page.
    ///
    /// A rasterisation failure yields an empty result, never an error.
    pub async fn summarize_pages(
        &self,
        pdf_path: &Path,
        sinks: &mut [Box<dyn DisplaySink>],
    ) -> Vec<PageSummary> {
        let pages = render::rasterize_pages(
            pdf_path,
            &self.config.image_dir,
            self.config.max_rendered_pixels,
            self.config.password.as_deref(),
        )
        .await;
        info!("Rasterised {} pages", pages.len());
        self.summarize_rendered(&pages, sinks).await
    }

    /// OCR and summarise already-rendered pages, in order.
    pub async fn summarize_rendered(
        &self,
        pages: &[PageImage],
        sinks: &mut [Box<dyn DisplaySink>],
    ) -> Vec<PageSummary> {
        let total = pages.len();
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_pages_rendered(total);
        }

        let mut summaries = Vec::with_capacity(total);
        for page in pages {
            if let Some(ref cb) = self.config.progress_callback {
                cb.on_page_start(page.page_num, total);
            }

            let ocr_text = ocr_page(self.ocr.as_ref(), &page.path).await;
            let outcome = match ocr_text.as_deref() {
                Some(text) => {
                    let summary = self.summarizer.summarize_page(page, Some(text)).await;
                    if let Some(ref cb) = self.config.progress_callback {
                        cb.on_page_summarized(page.page_num, total, &summary);
                    }
                    PageOutcome::Summarized(summary)
                }
                None => {
                    info!("Page {}: no text extracted, skipping summary", page.page_num);
                    if let Some(ref cb) = self.config.progress_callback {
                        cb.on_page_skipped(page.page_num, total);
                    }
                    PageOutcome::NoTextExtracted
                }
            };

            let summary = PageSummary {
                page_num: page.page_num,
                image_path: page.path.clone(),
                ocr_text,
                outcome,
            };
            for sink in sinks.iter_mut() {
                if let Err(e) = sink.show(&summary) {
                    warn!("Display failed for page {}: {}", summary.page_num, e);
                }
            }
            summaries.push(summary);
        }

        for sink in sinks.iter_mut() {
            if let Err(e) = sink.finish() {
                warn!("Display sink failed to finish: {}", e);
            }
        }
        summaries
    }

    // ── Index ────────────────────────────────────────────────────────────

    /// Chunk `text` and index every chunk under `source`.
    pub async fn index_text(&mut self, text: &str, source: &str) -> Result<usize, PdfRagError> {
        let chunks = self.splitter.split(text, source);
        debug!(
            "Split {} chars into {} chunks (size {}, overlap {})",
            text.chars().count(),
            chunks.len(),
            self.splitter.chunk_size(),
            self.splitter.chunk_overlap()
        );
        let n = self.retriever.index(chunks).await?;
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_indexed(n);
        }
        Ok(n)
    }

    /// Extract the PDF text layer and index it. Returns `(chars, chunks)`.
    pub async fn index_document(
        &mut self,
        pdf_path: &Path,
        source: &str,
    ) -> Result<(usize, usize), PdfRagError> {
        let text = extract::extract_text(pdf_path, self.config.password.as_deref()).await?;
        let chars = text.chars().count();
        let chunks = self.index_text(&text, source).await?;
        Ok((chars, chunks))
    }

    // ── Ask ──────────────────────────────────────────────────────────────

    /// Retrieve the top-k chunks for `question` and generate an answer.
    pub async fn ask(&self, question: &str) -> Result<Answer, PdfRagError> {
        let context = self.retriever.retrieve(question, self.config.top_k).await?;
        let answer = self.generator.generate(question, &context).await?;
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_answer(&answer);
        }
        Ok(Answer {
            question: question.to_string(),
            answer,
            context,
        })
    }

    // ── Full run ─────────────────────────────────────────────────────────

    /// Run the whole pipeline on a path or URL.
    ///
    /// The summary pass runs only when `config.summarize_pages` is set; the
    /// answer step only when `question` is given.
    pub async fn run(
        &mut self,
        input_str: &str,
        question: Option<&str>,
        sinks: &mut [Box<dyn DisplaySink>],
    ) -> Result<RunReport, PdfRagError> {
        let total_start = Instant::now();
        info!("Starting run: {}", input_str);

        let resolved = input::resolve_input(input_str, self.config.download_timeout_secs).await?;
        let pdf_path = resolved.path().to_path_buf();
        let source = resolved.source_name();

        let metadata =
            render::extract_metadata(&pdf_path, self.config.password.as_deref()).await?;
        info!("PDF: {} pages", metadata.page_count);

        let summary_start = Instant::now();
        let pages = if self.config.summarize_pages {
            self.summarize_pages(&pdf_path, sinks).await
        } else {
            Vec::new()
        };
        let summary_duration_ms = summary_start.elapsed().as_millis() as u64;

        let index_start = Instant::now();
        let (extracted_chars, chunk_count) = self.index_document(&pdf_path, &source).await?;
        let index_duration_ms = index_start.elapsed().as_millis() as u64;

        let answer_start = Instant::now();
        let answer = match question {
            Some(q) => Some(self.ask(q).await?),
            None => None,
        };
        let answer_duration_ms = answer_start.elapsed().as_millis() as u64;

        let summarized_pages = pages
            .iter()
            .filter(|p| matches!(p.outcome, PageOutcome::Summarized(_)))
            .count();
        let stats = RunStats {
            total_pages: metadata.page_count,
            summarized_pages,
            skipped_pages: pages.len() - summarized_pages,
            extracted_chars,
            chunk_count,
            summary_duration_ms,
            index_duration_ms,
            answer_duration_ms,
            total_duration_ms: total_start.elapsed().as_millis() as u64,
        };
        info!(
            "Run complete: {} chunks indexed, {}ms total",
            stats.chunk_count, stats.total_duration_ms
        );

        Ok(RunReport {
            source,
            metadata,
            pages,
            answer,
            stats,
        })
    }
}

/// Read document metadata without OCR, embedding or model calls.
///
/// `download_timeout_secs` bounds the download when `input_str` is a URL.
pub async fn inspect(
    input_str: impl AsRef<str>,
    download_timeout_secs: u64,
) -> Result<DocumentMetadata, PdfRagError> {
    let resolved = input::resolve_input(input_str.as_ref(), download_timeout_secs).await?;
    render::extract_metadata(resolved.path(), None).await
}

/// One-shot convenience: index `input_str` and answer `question`.
pub async fn ask(
    input_str: impl AsRef<str>,
    question: &str,
    config: RagConfig,
) -> Result<Answer, PdfRagError> {
    let mut pipeline = RagPipeline::from_config(config)?;
    let report = pipeline.run(input_str.as_ref(), Some(question), &mut []).await?;
    report
        .answer
        .ok_or_else(|| PdfRagError::Internal("run finished without an answer".into()))
}
