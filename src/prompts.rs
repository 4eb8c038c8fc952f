//! Prompts sent to chat and vision models.
//!
//! Every prompt lives here so changing the wording touches exactly one file
//! and unit tests can inspect prompts without a live model.

/// System message for page summaries.
pub const SUMMARY_SYSTEM_PROMPT: &str =
    "You are an assistant that summarizes the content of document pages. \
Given details about a page image and the text recognized on it, write a short \
summary of what the page is about in two or three sentences.";

/// Returned instead of a summary when OCR produced no text.
pub const NO_TEXT_TO_SUMMARIZE: &str = "No text to summarize.";

/// Returned instead of a summary when the model call failed.
pub const SUMMARY_ERROR: &str = "Error generating summary.";

/// System message for the final answer.
pub const ANSWER_SYSTEM_PROMPT: &str =
    "You are an assistant for question-answering tasks. Use the following pieces \
of retrieved context to answer the question. Use three to five sentences maximum \
and keep the answer concise.";

/// System message for the vision OCR backend.
pub const VISION_OCR_PROMPT: &str =
    "You are an OCR engine. Transcribe all text visible in the page image exactly \
as written, in reading order. Output only the transcribed text with no commentary. \
If the image contains no readable text, output nothing.";

/// Build the user message for a page summary.
///
/// `excerpt` must already be truncated to the configured character budget.
pub fn summary_user_prompt(format: &str, width: u32, height: u32, mode: &str, excerpt: &str) -> String {
    format!(
        "Image details:\n\
         - Format: {format}\n\
         - Size: ({width}, {height})\n\
         - Mode: {mode}\n\n\
         Extracted text (first part):\n{excerpt}\n\n\
         Summarize this page."
    )
}

/// Build the human turn of the answer prompt.
pub fn answer_user_prompt(context: &str, question: &str) -> String {
    format!("Context:\n{context}\n\nQuestion: {question}\n\nAnswer:")
}

/// Take at most `max_chars` characters of `text`, never splitting a code point.
pub fn excerpt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
