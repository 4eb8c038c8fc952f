//! Fixed-size overlapping chunking of the extracted document text.
//!
//! Windows are measured in characters (Unicode scalar values), never bytes,
//! so multi-byte text cannot be split inside a code point. With size `S` and
//! overlap `O` the window start advances by `S - O`; the last window ends at
//! the end of the text and may be shorter than `S`.
//!
//! ```text
//! text:    |--------------------------------------------|
//! chunk 0: |------S------|
//! chunk 1:          |--O--|------S-O------|
//! chunk 2:                          |--O--|-----rest----|
//! ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A bounded-length segment of the document text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: Uuid,
    /// Position of the chunk in the document, from 0.
    pub index: usize,
    pub text: String,
    /// Character offset of the first character in the source text.
    pub start_char: usize,
    /// Character offset one past the last character.
    pub end_char: usize,
    /// Name of the source document.
    pub source: String,
}

/// Sliding-window splitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    /// Create a splitter. `chunk_overlap` is clamped below `chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split `text` into chunks tagged with `source`.
    pub fn split(&self, text: &str, source: &str) -> Vec<Chunk> {
        self.split_spans(text)
            .into_iter()
            .enumerate()
            .map(|(index, (start_char, end_char, body))| Chunk {
                id: Uuid::new_v4(),
                index,
                text: body.to_string(),
                start_char,
                end_char,
                source: source.to_string(),
            })
            .collect()
    }

    /// Split into `(start_char, end_char, slice)` spans.
    fn split_spans<'a>(&self, text: &'a str) -> Vec<(usize, usize, &'a str)> {
        // Byte offset of every char boundary, plus the end of the string.
        let boundaries: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let total_chars = boundaries.len() - 1;
        if total_chars == 0 {
            return Vec::new();
        }

        let stride = self.chunk_size - self.chunk_overlap;
        let mut spans = Vec::new();
        let mut start = 0;

        loop {
            let end = (start + self.chunk_size).min(total_chars);
            spans.push((start, end, &text[boundaries[start]..boundaries[end]]));
            if end == total_chars {
                break;
            }
            start += stride;
        }

        spans
    }
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self::new(400, 50)
    }
}
