//! Error types for the edgequake-pdf-rag library.
//!
//! The pipeline mixes several failure policies, so there are several error
//! types rather than one:
//!
//! * [`PdfRagError`] — **Fatal**: the run cannot continue (bad input file,
//!   provider not configured, generation failed, nothing retrieved). Returned
//!   as `Err(PdfRagError)` from extraction, indexing and answering.
//!
//! * [`OcrError`] — raised by an [`crate::pipeline::ocr::OcrEngine`]. The
//!   pipeline never propagates it: [`crate::pipeline::ocr::ocr_page`] logs it
//!   and hands back `None` so the page is skipped downstream.
//!
//! * [`LlmError`] — raised by a [`crate::pipeline::llm::ChatModel`]. The page
//!   summarizer swallows it; the answer generator converts it into
//!   [`PdfRagError::LlmApiError`].
//!
//! Rasterisation has no error type at its public surface at all: any failure
//! collapses to an empty page list (see [`crate::pipeline::render`]).

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-pdf-rag library.
#[derive(Debug, Error)]
pub enum PdfRagError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// pdfium returned an error while reading a page's text layer.
    #[error("Text extraction failed for page {page}: {detail}")]
    TextExtractionFailed { page: usize, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium (or its directory), or install\n\
pdfium system-wide so the dynamic loader can find it.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Model errors ──────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The chat model returned an error while generating the answer.
    #[error("LLM API error: {message}")]
    LlmApiError { message: String },

    /// The embedding backend failed or returned the wrong number of vectors.
    #[error("Embedding failed: {0}")]
    EmbeddingFailed(String),

    // ── Index errors ──────────────────────────────────────────────────────
    /// A vector does not match the dimension the collection was created with.
    #[error("Dimension mismatch in collection '{collection}': expected {expected}, got {actual}")]
    DimensionMismatch {
        collection: String,
        expected: usize,
        actual: usize,
    },

    /// Similarity search returned nothing, so there is no context to answer from.
    #[error("No relevant context found for question: '{query}'")]
    NoRelevantContext { query: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failure of a single OCR call.
#[derive(Debug, Error)]
pub enum OcrError {
    /// The OCR backend is not installed or not reachable.
    #[error("OCR engine '{engine}' is unavailable: {detail}")]
    Unavailable { engine: String, detail: String },

    /// The engine ran but reported failure.
    #[error("OCR engine '{engine}' failed on '{path}': {detail}")]
    EngineFailed {
        engine: String,
        path: PathBuf,
        detail: String,
    },

    /// The image could not be read or decoded.
    #[error("Cannot read image '{path}': {detail}")]
    UnreadableImage { path: PathBuf, detail: String },
}

/// Failure of a single chat-model call.
#[derive(Debug, Clone, Error)]
pub enum LlmError {
    /// Transport or provider-side failure.
    #[error("{0}")]
    Api(String),

    /// The provider answered with an empty completion.
    #[error("model returned an empty response")]
    EmptyResponse,
}

impl From<LlmError> for PdfRagError {
    fn from(e: LlmError) -> Self {
        PdfRagError::LlmApiError {
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_relevant_context_display() {
        let e = PdfRagError::NoRelevantContext {
            query: "What is the BLEU score?".into(),
        };
        assert!(e.to_string().contains("BLEU"), "got: {e}");
    }

    #[test]
    fn dimension_mismatch_display() {
        let e = PdfRagError::DimensionMismatch {
            collection: "pdf_chunks".into(),
            expected: 384,
            actual: 1536,
        };
        let msg = e.to_string();
        assert!(msg.contains("384"));
        assert!(msg.contains("1536"));
        assert!(msg.contains("pdf_chunks"));
    }

    #[test]
    fn llm_error_converts_to_api_error() {
        let e: PdfRagError = LlmError::Api("429 Too Many Requests".into()).into();
        match e {
            PdfRagError::LlmApiError { message } => assert!(message.contains("429")),
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn ocr_error_display() {
        let e = OcrError::EngineFailed {
            engine: "tesseract".into(),
            path: PathBuf::from("page_1.png"),
            detail: "exit status 1".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("tesseract"));
        assert!(msg.contains("page_1.png"));
    }
}
