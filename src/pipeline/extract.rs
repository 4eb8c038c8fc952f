//! Direct text extraction from the PDF text layer.
//!
//! The extracted text is what gets chunked and indexed. Pages without a text
//! layer (scans) contribute an empty string; the OCR pass in
//! [`crate::pipeline::ocr`] is only used for page summaries.

use crate::error::PdfRagError;
use crate::pipeline::render::{bind_pdfium, open_document};
use std::path::Path;
use tracing::{debug, info};

/// Joins page texts in the concatenated document text.
pub const PAGE_JOINER: &str = "\n";

/// Extract the text of every page, in page order.
pub async fn extract_page_texts(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<Vec<String>, PdfRagError> {
    let path = pdf_path.to_path_buf();
    let pwd = password.map(|s| s.to_string());

    tokio::task::spawn_blocking(move || extract_page_texts_blocking(&path, pwd.as_deref()))
        .await
        .map_err(|e| PdfRagError::Internal(format!("Extraction task panicked: {}", e)))?
}

/// Extract the whole document as one string.
pub async fn extract_text(pdf_path: &Path, password: Option<&str>) -> Result<String, PdfRagError> {
    let pages = extract_page_texts(pdf_path, password).await?;
    let text = join_pages(&pages);
    info!(
        "Extracted {} chars from {} pages",
        text.chars().count(),
        pages.len()
    );
    Ok(text)
}

/// Concatenate page texts; empty pages still count as a (blank) page.
pub fn join_pages(pages: &[String]) -> String {
    pages.join(PAGE_JOINER)
}

fn extract_page_texts_blocking(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<Vec<String>, PdfRagError> {
    let pdfium = bind_pdfium()?;
    let document = open_document(&pdfium, pdf_path, password)?;

    let mut texts = Vec::with_capacity(document.pages().len() as usize);
    for (idx, page) in document.pages().iter().enumerate() {
        let text = page
            .text()
            .map_err(|e| PdfRagError::TextExtractionFailed {
                page: idx + 1,
                detail: format!("{:?}", e),
            })?
            .all();
        debug!("Page {}: {} chars of embedded text", idx + 1, text.len());
        texts.push(text);
    }

    Ok(texts)
}
