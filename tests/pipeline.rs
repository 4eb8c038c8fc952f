//! Pipeline integration tests with in-process fakes.
//!
//! No network, no API keys, no tesseract. Fake OCR engines and chat models
//! stand in for the external capabilities so that stage policies and
//! sequencing can be checked deterministically.

use async_trait::async_trait;
use edgequake_pdf_rag::pipeline::render::{self, ImageDetails, PageImage};
use edgequake_pdf_rag::{
    ChatModel, DisplaySink, EmbeddingBackend, GenerationOptions, HashingEmbedder,
    InMemoryVectorStore, LlmError, MarkdownReportSink, OcrEngine, OcrError, PageOutcome,
    PdfRagError, PipelineProgressCallback, PromptMessage, RagConfig, RagPipeline,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ── Fakes ────────────────────────────────────────────────────────────────────

/// Answers questions by echoing the context line; summarises with a fixed line.
#[derive(Default)]
struct FakeChat {
    calls: AtomicUsize,
    last_prompt: Mutex<String>,
}

#[async_trait]
impl ChatModel for FakeChat {
    async fn chat(
        &self,
        messages: &[PromptMessage],
        _options: &GenerationOptions,
    ) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let prompt = messages.last().map(|m| m.content.clone()).unwrap_or_default();
        *self.last_prompt.lock().unwrap() = prompt.clone();

        if let Some(rest) = prompt.strip_prefix("Context:\n") {
            let context = rest.split("\n\nQuestion:").next().unwrap_or_default();
            return Ok(format!("According to the paper: {context}"));
        }
        Ok("  A page about attention.  ".into())
    }
}

/// Returns scripted text per page file name; anything else fails.
struct ScriptedOcr {
    by_file: HashMap<String, Result<String, ()>>,
}

#[async_trait]
impl OcrEngine for ScriptedOcr {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn recognize(&self, image_path: &Path) -> Result<String, OcrError> {
        let file = image_path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();
        match self.by_file.get(&file) {
            Some(Ok(text)) => Ok(text.clone()),
            _ => Err(OcrError::UnreadableImage {
                path: image_path.to_path_buf(),
                detail: "scripted failure".into(),
            }),
        }
    }
}

#[derive(Default)]
struct RecordingProgress {
    events: Mutex<Vec<String>>,
}

impl PipelineProgressCallback for RecordingProgress {
    fn on_pages_rendered(&self, total_pages: usize) {
        self.events.lock().unwrap().push(format!("rendered {total_pages}"));
    }
    fn on_page_summarized(&self, page_num: usize, _total: usize, _summary: &str) {
        self.events.lock().unwrap().push(format!("summarized {page_num}"));
    }
    fn on_page_skipped(&self, page_num: usize, _total: usize) {
        self.events.lock().unwrap().push(format!("skipped {page_num}"));
    }
    fn on_indexed(&self, chunk_count: usize) {
        self.events.lock().unwrap().push(format!("indexed {chunk_count}"));
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn config(image_dir: &Path, progress: Option<Arc<RecordingProgress>>) -> RagConfig {
    let mut builder = RagConfig::builder()
        .image_dir(image_dir)
        .embedding_backend(EmbeddingBackend::Hashing { dimension: 512 });
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb as Arc<dyn PipelineProgressCallback>);
    }
    builder.build().unwrap()
}

fn pipeline(
    config: RagConfig,
    chat: Arc<FakeChat>,
    ocr: HashMap<String, Result<String, ()>>,
) -> RagPipeline {
    RagPipeline::with_components(
        config,
        chat,
        Arc::new(HashingEmbedder::new(512)),
        Box::new(InMemoryVectorStore::new("pdf_chunks")),
        Arc::new(ScriptedOcr { by_file: ocr }),
    )
}

/// Write a small PNG and return it as a rendered page.
fn rendered_page(dir: &Path, page_num: usize) -> PageImage {
    let image = image::DynamicImage::new_rgb8(40, 20);
    let path: PathBuf = render::page_image_path(dir, page_num);
    image.save(&path).unwrap();
    PageImage {
        page_num,
        path,
        details: ImageDetails::of_image(&image, image::ImageFormat::Png),
    }
}

const PAPER_TEXT: &str = "\
The Transformer is a model architecture eschewing recurrence and instead relying entirely \
on an attention mechanism to draw global dependencies between input and output. \
Multi-head attention allows the model to jointly attend to information from different \
representation subspaces at different positions, with eight parallel attention layers. \
We apply dropout to the output of each sub-layer and to the sums of the embeddings and the \
positional encodings, using a rate of 0.1 for the base model throughout training runs. \
On the WMT 2014 English-to-German translation task our base model reaches a BLEU score of \
27.3, while the big model establishes a new state of the art BLEU score of 28.4, \
improving over the best previously reported models including ensembles. \
Positional encodings are added to the input embeddings at the bottoms of the encoder and \
decoder stacks; we use sine and cosine functions of different frequencies.";

// ── Summary pass ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn ocr_failure_skips_summarizer_and_reports_no_text() {
    let dir = tempfile::tempdir().unwrap();
    let progress = Arc::new(RecordingProgress::default());
    let chat = Arc::new(FakeChat::default());
    let ocr = HashMap::from([
        ("page_1.png".to_string(), Ok("Attention is all you need.".to_string())),
        ("page_2.png".to_string(), Err(())),
        ("page_3.png".to_string(), Ok("   \n".to_string())),
    ]);
    let p = pipeline(config(dir.path(), Some(progress.clone())), chat.clone(), ocr);

    let pages: Vec<PageImage> = (1..=3).map(|n| rendered_page(dir.path(), n)).collect();
    let summaries = p.summarize_rendered(&pages, &mut []).await;

    assert_eq!(summaries.len(), 3);
    assert_eq!(
        summaries[0].outcome,
        PageOutcome::Summarized("A page about attention.".into())
    );
    assert_eq!(summaries[1].outcome, PageOutcome::NoTextExtracted);
    assert_eq!(summaries[1].display_text(), "No text extracted from this page.");
    assert_eq!(summaries[2].outcome, PageOutcome::NoTextExtracted);
    assert!(summaries[2].ocr_text.is_none());

    // Only page 1 reached the model.
    assert_eq!(chat.calls.load(Ordering::SeqCst), 1);
    let prompt = chat.last_prompt.lock().unwrap().clone();
    assert!(prompt.contains("Format: PNG"));
    assert!(prompt.contains("Size: (40, 20)"));
    assert!(prompt.contains("Mode: RGB"));
    assert!(prompt.contains("Attention is all you need."));

    let events = progress.events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec!["rendered 3", "summarized 1", "skipped 2", "skipped 3"]
    );
}

#[tokio::test]
async fn summary_pass_writes_markdown_report() {
    let dir = tempfile::tempdir().unwrap();
    let report = dir.path().join("summaries.md");
    let ocr = HashMap::from([("page_1.png".to_string(), Ok("Intro text.".to_string()))]);
    let p = pipeline(config(dir.path(), None), Arc::new(FakeChat::default()), ocr);

    let pages = vec![rendered_page(dir.path(), 1), rendered_page(dir.path(), 2)];
    let mut sinks: Vec<Box<dyn DisplaySink>> = vec![Box::new(MarkdownReportSink::new(&report))];
    p.summarize_rendered(&pages, &mut sinks).await;

    let written = std::fs::read_to_string(&report).unwrap();
    assert!(written.contains("![page 1](page_1.png)"));
    assert!(written.contains("A page about attention."));
    assert!(written.contains("## Page 2"));
    assert!(written.contains("No text extracted from this page."));
}

#[tokio::test]
async fn summary_uses_details_recorded_at_render_time() {
    let dir = tempfile::tempdir().unwrap();
    let chat = Arc::new(FakeChat::default());
    let ocr = HashMap::from([("page_1.png".to_string(), Ok("Scaled dot-product.".to_string()))]);
    let p = pipeline(config(dir.path(), None), chat.clone(), ocr);

    // The OCR engine is scripted, so the PNG itself is never opened.
    let page = PageImage {
        page_num: 1,
        path: render::page_image_path(dir.path(), 1),
        details: ImageDetails {
            format: "PNG".into(),
            width: 1224,
            height: 1584,
            mode: "RGBA".into(),
        },
    };
    let summaries = p.summarize_rendered(&[page], &mut []).await;

    assert_eq!(
        summaries[0].outcome,
        PageOutcome::Summarized("A page about attention.".into())
    );
    let prompt = chat.last_prompt.lock().unwrap().clone();
    assert!(prompt.contains("Size: (1224, 1584)"));
    assert!(prompt.contains("Mode: RGBA"));
}

#[tokio::test]
async fn corrupt_pdf_rasterizes_to_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("broken.pdf");
    std::fs::write(&pdf, b"%PDF-1.7\nthis is not really a pdf").unwrap();

    let progress = Arc::new(RecordingProgress::default());
    let chat = Arc::new(FakeChat::default());
    let p = pipeline(
        config(dir.path(), Some(progress.clone())),
        chat.clone(),
        HashMap::new(),
    );

    let summaries = p.summarize_pages(&pdf, &mut []).await;
    assert!(summaries.is_empty());
    assert_eq!(chat.calls.load(Ordering::SeqCst), 0);
    assert_eq!(
        progress.events.lock().unwrap().clone(),
        vec!["rendered 0"]
    );
}

// ── Index + ask ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn bleu_question_retrieves_bleu_chunk_top1() {
    let dir = tempfile::tempdir().unwrap();
    let progress = Arc::new(RecordingProgress::default());
    let chat = Arc::new(FakeChat::default());
    let mut p = pipeline(
        config(dir.path(), Some(progress.clone())),
        chat.clone(),
        HashMap::new(),
    );

    let n = p.index_text(PAPER_TEXT, "attention.pdf").await.unwrap();
    assert!(n > 1);
    assert_eq!(p.indexed_chunks(), n);
    assert_eq!(
        progress.events.lock().unwrap().last().cloned(),
        Some(format!("indexed {n}"))
    );

    let answer = p
        .ask("What is the BLEU score of the Transformer (base model)?")
        .await
        .unwrap();
    assert_eq!(answer.context.len(), 1);
    let top = &answer.context[0].chunk;
    assert!(top.text.contains("BLEU"), "top chunk: {:?}", top.text);
    assert_eq!(top.source, "attention.pdf");
    assert!(answer.answer.contains("BLEU"));
    assert_eq!(chat.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn empty_index_fails_with_no_relevant_context() {
    let dir = tempfile::tempdir().unwrap();
    let chat = Arc::new(FakeChat::default());
    let p = pipeline(config(dir.path(), None), chat.clone(), HashMap::new());

    let err = p.ask("What is the BLEU score?").await.unwrap_err();
    assert!(matches!(err, PdfRagError::NoRelevantContext { .. }));
    assert_eq!(chat.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn indexing_empty_text_adds_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut p = pipeline(
        config(dir.path(), None),
        Arc::new(FakeChat::default()),
        HashMap::new(),
    );
    let n = tokio_test::block_on(p.index_text("", "empty.pdf")).unwrap();
    assert_eq!(n, 0);
    assert_eq!(p.indexed_chunks(), 0);
}

#[tokio::test]
async fn run_on_missing_file_fails_before_any_model_call() {
    let dir = tempfile::tempdir().unwrap();
    let chat = Arc::new(FakeChat::default());
    let mut p = pipeline(config(dir.path(), None), chat.clone(), HashMap::new());

    let err = p
        .run(
            dir.path().join("missing.pdf").to_str().unwrap(),
            Some("anything"),
            &mut [],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, PdfRagError::FileNotFound { .. }));
    assert_eq!(chat.calls.load(Ordering::SeqCst), 0);
}
