//! CLI binary for edgequake-pdf-rag.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `RagConfig`, runs the pipeline and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pdf_rag::{
    inspect, ConsoleSink, DisplaySink, EmbeddingBackend, MarkdownReportSink, OcrBackend,
    PipelineProgressCallback, ProgressCallback, RagConfig, RagPipeline,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a page bar for the summary pass plus one log
/// line per page, then a spinner while indexing and answering.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Wall-clock start of the page currently being processed.
    page_started: Mutex<Option<Instant>>,
    skipped: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            page_started: Mutex::new(None),
            skipped: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Summarising");
        self.bar.reset_eta();
    }

    fn page_elapsed_secs(&self) -> f64 {
        self.page_started
            .lock()
            .unwrap()
            .take()
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl PipelineProgressCallback for CliProgressCallback {
    fn on_pages_rendered(&self, total_pages: usize) {
        if total_pages == 0 {
            self.bar
                .println(format!("{} {}", yellow("⚠"), "No pages rendered; summary pass skipped"));
            return;
        }
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Summarising {total_pages} pages…"))
        ));
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        *self.page_started.lock().unwrap() = Some(Instant::now());
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_summarized(&self, page_num: usize, total: usize, summary: &str) {
        let secs = self.page_elapsed_secs();
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {:<8}  {}",
            green("✓"),
            page_num,
            total,
            dim(&format!("{:>5} chars", summary.chars().count())),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_page_skipped(&self, page_num: usize, total: usize) {
        let secs = self.page_elapsed_secs();
        self.skipped.fetch_add(1, Ordering::SeqCst);
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            yellow("–"),
            page_num,
            total,
            yellow("no text extracted"),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_indexed(&self, chunk_count: usize) {
        let skipped = self.skipped.load(Ordering::SeqCst);
        if skipped > 0 {
            self.bar
                .println(format!("  {} {} pages had no OCR text", yellow("⚠"), skipped));
        }
        self.bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        self.bar.set_prefix("Answering");
        self.bar.set_message("retrieving context…");
        self.bar.println(format!(
            "{} {}",
            green("✔"),
            bold(&format!("{chunk_count} chunks indexed"))
        ));
    }

    fn on_answer(&self, _answer: &str) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Ask a question about a local PDF
  pdfrag paper.pdf --query "What is the BLEU score of the Transformer (base model)?"

  # Download once, then ask
  pdfrag https://arxiv.org/pdf/1706.03762 --query "How many attention heads?"

  # Summarise every page (tesseract OCR) and write a Markdown report
  pdfrag paper.pdf --summarize-pages --summary-report summaries.md

  # OCR with the vision model instead of tesseract
  pdfrag paper.pdf --summarize-pages --ocr vision --model gpt-4.1-mini

  # Fully local retrieval (no embedding API)
  pdfrag paper.pdf --embedder hashing --query "dropout rate"

  # Inspect PDF metadata (no API key needed)
  pdfrag --inspect-only paper.pdf

  # JSON run report
  pdfrag --json paper.pdf --query "..." > report.json

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PDFIUM_LIB_PATH         Path to libpdfium (file or directory)
  RUST_LOG                Log filter, overrides --verbose / --quiet

SETUP:
  1. Install pdfium (or set PDFIUM_LIB_PATH) and, for OCR, tesseract.
  2. Set API key:     export OPENAI_API_KEY=sk-...
  3. Ask:             pdfrag document.pdf --query "..."
"#;

/// Ask questions about PDF files and URLs.
#[derive(Parser, Debug)]
#[command(
    name = "pdfrag",
    version,
    about = "Ask questions about PDF files and URLs with retrieval-augmented LLM answers",
    long_about = "Extract the text of a PDF (local file or URL), index it in an in-memory \
vector store and answer questions from the most relevant passage. Optionally render, OCR \
and summarise every page.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Question to answer from the document.
    #[arg(long, env = "PDFRAG_QUERY")]
    query: Option<String>,

    /// LLM model ID (e.g. gpt-4.1-nano, gpt-4.1-mini, claude-sonnet-4-20250514).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Render, OCR and summarise every page before indexing.
    #[arg(long, env = "PDFRAG_SUMMARIZE_PAGES")]
    summarize_pages: bool,

    /// Directory for rendered `page_{n}.png` files.
    #[arg(long, env = "PDFRAG_IMAGE_DIR", default_value = ".")]
    image_dir: PathBuf,

    /// Longest rendered page edge in pixels.
    #[arg(long, env = "PDFRAG_MAX_PIXELS", default_value_t = 2000,
          value_parser = clap::value_parser!(u32).range(100..=10000))]
    max_pixels: u32,

    /// OCR engine for the summary pass.
    #[arg(long, env = "PDFRAG_OCR", value_enum, default_value = "tesseract")]
    ocr: OcrArg,

    /// Tesseract language code(s), e.g. `eng` or `eng+deu`.
    #[arg(long, env = "PDFRAG_OCR_LANGUAGE", default_value = "eng")]
    ocr_language: String,

    /// Write page summaries to this Markdown file (implies --summarize-pages).
    #[arg(long, env = "PDFRAG_SUMMARY_REPORT")]
    summary_report: Option<PathBuf>,

    /// Embedding backend.
    #[arg(long, env = "PDFRAG_EMBEDDER", value_enum, default_value = "provider")]
    embedder: EmbedderArg,

    /// Vector dimension for `--embedder hashing`.
    #[arg(long, env = "PDFRAG_HASHING_DIMENSION", default_value_t = 1024)]
    hashing_dimension: usize,

    /// Characters per chunk.
    #[arg(long, env = "PDFRAG_CHUNK_SIZE", default_value_t = 400)]
    chunk_size: usize,

    /// Characters shared by consecutive chunks.
    #[arg(long, env = "PDFRAG_CHUNK_OVERLAP", default_value_t = 50)]
    chunk_overlap: usize,

    /// Number of chunks retrieved as context.
    #[arg(long, env = "PDFRAG_TOP_K", default_value_t = 1)]
    top_k: usize,

    /// Vector store collection name.
    #[arg(long, env = "PDFRAG_COLLECTION", default_value = "pdf_chunks")]
    collection: String,

    /// Max LLM output tokens per call.
    #[arg(long, env = "PDFRAG_MAX_TOKENS", default_value_t = 1024)]
    max_tokens: usize,

    /// Temperature for page summaries (answers always use 0.0).
    #[arg(long, env = "PDFRAG_SUMMARY_TEMPERATURE", default_value_t = 0.7)]
    summary_temperature: f32,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDFRAG_PASSWORD")]
    password: Option<String>,

    /// Output the structured RunReport as JSON.
    #[arg(long, env = "PDFRAG_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDFRAG_NO_PROGRESS")]
    no_progress: bool,

    /// Print PDF metadata only; no OCR, embedding or model calls.
    #[arg(long)]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFRAG_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the answer.
    #[arg(short, long, env = "PDFRAG_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PDFRAG_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,
}

impl Cli {
    /// `--summary-report` turns the summary pass on by itself.
    fn summary_pass(&self) -> bool {
        self.summarize_pages || self.summary_report.is_some()
    }
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum OcrArg {
    Tesseract,
    Vision,
}

impl From<OcrArg> for OcrBackend {
    fn from(v: OcrArg) -> Self {
        match v {
            OcrArg::Tesseract => OcrBackend::Tesseract,
            OcrArg::Vision => OcrBackend::Vision,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum EmbedderArg {
    Provider,
    Hashing,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs unless --verbose is given.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let meta = inspect(&cli.input, cli.download_timeout)
            .await
            .context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("Failed to serialize metadata")?
            );
        } else {
            println!("File:         {}", cli.input);
            if let Some(ref t) = meta.title {
                println!("Title:        {}", t);
            }
            if let Some(ref a) = meta.author {
                println!("Author:       {}", a);
            }
            if let Some(ref s) = meta.subject {
                println!("Subject:      {}", s);
            }
            println!("Pages:        {}", meta.page_count);
            println!("PDF Version:  {}", meta.pdf_version);
            if let Some(ref p) = meta.producer {
                println!("Producer:     {}", p);
            }
            if let Some(ref c) = meta.creator {
                println!("Creator:      {}", c);
            }
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress = show_progress.then(CliProgressCallback::new);
    let config = build_config(
        &cli,
        progress
            .clone()
            .map(|cb| cb as Arc<dyn PipelineProgressCallback>),
    )?;

    let mut sinks: Vec<Box<dyn DisplaySink>> = Vec::new();
    if cli.summary_pass() && !cli.json && !cli.quiet {
        sinks.push(Box::new(ConsoleSink::stdout()));
    }
    if let Some(ref path) = cli.summary_report {
        sinks.push(Box::new(MarkdownReportSink::new(path)));
    }

    // ── Run ──────────────────────────────────────────────────────────────
    let mut pipeline =
        RagPipeline::from_config(config).context("Failed to initialise pipeline")?;
    let result = pipeline
        .run(&cli.input, cli.query.as_deref(), &mut sinks)
        .await;
    if let Some(ref cb) = progress {
        cb.finish();
    }
    let report = result.context("Pipeline failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
        return Ok(());
    }

    if let Some(ref answer) = report.answer {
        if !cli.quiet {
            println!("{} {}", bold("Question:"), answer.question);
        }
        println!("{}", answer.answer);
    }

    if !cli.quiet {
        let stats = &report.stats;
        eprintln!(
            "{}  {} pages  {} chunks  {}ms",
            green("✔"),
            stats.total_pages,
            stats.chunk_count,
            stats.total_duration_ms,
        );
        if cli.summary_pass() {
            eprintln!(
                "   {} summarised  /  {} without text",
                dim(&stats.summarized_pages.to_string()),
                dim(&stats.skipped_pages.to_string()),
            );
        }
        if let Some(ref path) = cli.summary_report {
            eprintln!("   report  →  {}", bold(&path.display().to_string()));
        }
    }

    Ok(())
}

/// Map CLI args to `RagConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<RagConfig> {
    let embedding_backend = match cli.embedder {
        EmbedderArg::Provider => EmbeddingBackend::Provider,
        EmbedderArg::Hashing => EmbeddingBackend::Hashing {
            dimension: cli.hashing_dimension,
        },
    };

    let mut builder = RagConfig::builder()
        .max_rendered_pixels(cli.max_pixels)
        .image_dir(cli.image_dir.clone())
        .chunk_size(cli.chunk_size)
        .chunk_overlap(cli.chunk_overlap)
        .top_k(cli.top_k)
        .collection_name(cli.collection.clone())
        .max_tokens(cli.max_tokens)
        .summary_temperature(cli.summary_temperature)
        .ocr_backend(cli.ocr.clone().into())
        .ocr_language(cli.ocr_language.clone())
        .embedding_backend(embedding_backend)
        .summarize_pages(cli.summary_pass())
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
