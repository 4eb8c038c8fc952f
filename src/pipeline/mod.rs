//! Pipeline stages for PDF question answering.
//!
//! Each submodule implements one step, behind a capability trait where a
//! backend could be swapped (OCR engine, chat model, embedder, vector store,
//! display).
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ chunk ──▶ embed ──▶ store ──▶ retrieve ──▶ generate
//!   │
//!   └─────▶ render ──▶ ocr ──▶ summarize ──▶ display
//! ```
//!
//! 1. [`input`]     — canonicalise a path or URL to a local file
//! 2. [`extract`]   — pdfium text layer, pages joined with `\n`
//! 3. [`render`]    — rasterise pages to `page_{n}.png`; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 4. [`ocr`]       — tesseract subprocess or vision model per page image
//! 5. [`summarize`] — image details + OCR excerpt → short summary
//! 6. [`display`]   — console / Markdown report sinks
//! 7. [`chunk`]     — character sliding window (400 / 50)
//! 8. [`embed`], [`store`], [`retrieve`] — vectors, cosine search, top-k
//! 9. [`generate`]  — grounded answer from retrieved context
//!
//! [`llm`] and [`encode`] are shared by the stages that talk to a model.

pub mod chunk;
pub mod display;
pub mod embed;
pub mod encode;
pub mod extract;
pub mod generate;
pub mod input;
pub mod llm;
pub mod ocr;
pub mod render;
pub mod retrieve;
pub mod store;
pub mod summarize;
