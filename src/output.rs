//! Result types produced by a pipeline run.

use crate::pipeline::store::ScoredChunk;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Document-level metadata read from the PDF info dictionary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
}

/// What happened to one page in the OCR + summary pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "summary", rename_all = "snake_case")]
pub enum PageOutcome {
    /// OCR produced text and the summarizer returned this string.
    ///
    /// The string may be the substituted error message; summarisation errors
    /// never surface as a separate outcome.
    Summarized(String),
    /// OCR failed or found nothing; the summarizer was not called.
    NoTextExtracted,
}

/// Per-page record of the OCR + summary pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSummary {
    /// 1-indexed page number.
    pub page_num: usize,
    /// Where the rendered PNG was written.
    pub image_path: PathBuf,
    /// Recognised text, if any.
    pub ocr_text: Option<String>,
    pub outcome: PageOutcome,
}

impl PageSummary {
    /// Human-readable line for console display.
    pub fn display_text(&self) -> &str {
        match &self.outcome {
            PageOutcome::Summarized(s) => s,
            PageOutcome::NoTextExtracted => "No text extracted from this page.",
        }
    }
}

/// A generated answer with the context it was grounded on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub question: String,
    pub answer: String,
    pub context: Vec<ScoredChunk>,
}

/// Timing and volume counters for a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    pub total_pages: usize,
    pub summarized_pages: usize,
    pub skipped_pages: usize,
    pub extracted_chars: usize,
    pub chunk_count: usize,
    pub summary_duration_ms: u64,
    pub index_duration_ms: u64,
    pub answer_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Everything a run produced; serialised for `--json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub source: String,
    pub metadata: DocumentMetadata,
    pub pages: Vec<PageSummary>,
    pub answer: Option<Answer>,
    pub stats: RunStats,
}
