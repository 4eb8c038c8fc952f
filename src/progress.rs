//! Progress-callback trait for pipeline events.
//!
//! Inject an [`Arc<dyn PipelineProgressCallback>`] via
//! [`crate::config::RagConfigBuilder::progress_callback`] to receive events as
//! the pipeline renders pages, summarises them, indexes chunks and answers.
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdf_rag::{PipelineProgressCallback, RagConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     summarized: AtomicUsize,
//! }
//!
//! impl PipelineProgressCallback for CountingCallback {
//!     fn on_page_summarized(&self, page_num: usize, total_pages: usize, summary: &str) {
//!         self.summarized.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Page {}/{}: {}", page_num, total_pages, summary);
//!     }
//! }
//!
//! let cb = Arc::new(CountingCallback { summarized: AtomicUsize::new(0) });
//! let config = RagConfig::builder()
//!     .progress_callback(cb as Arc<dyn PipelineProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the pipeline as it moves through its stages.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Pages are processed one at a time, so events for a
/// run arrive in order.
pub trait PipelineProgressCallback: Send + Sync {
    /// Called once after rasterisation. `total_pages` is 0 when rendering failed.
    fn on_pages_rendered(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called before a page is sent to OCR.
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when a page produced a summary (possibly the substituted error text).
    fn on_page_summarized(&self, page_num: usize, total_pages: usize, summary: &str) {
        let _ = (page_num, total_pages, summary);
    }

    /// Called when OCR produced no text and the page was skipped.
    fn on_page_skipped(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called once chunks are embedded and stored.
    fn on_indexed(&self, chunk_count: usize) {
        let _ = chunk_count;
    }

    /// Called after the answer has been generated.
    fn on_answer(&self, answer: &str) {
        let _ = answer;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl PipelineProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::RagConfig`].
pub type ProgressCallback = Arc<dyn PipelineProgressCallback>;
