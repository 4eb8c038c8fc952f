//! Embedding backends.
//!
//! [`Embedder`] turns a batch of texts into one vector per text. Two
//! implementations ship:
//!
//! * [`ProviderEmbedder`] — any edgequake-llm embedding provider (OpenAI,
//!   Gemini, Ollama, …), auto-detected from the environment.
//! * [`HashingEmbedder`] — local feature hashing of lowercase word tokens.
//!   Deterministic and offline; similarity is purely lexical.

use crate::error::PdfRagError;
use async_trait::async_trait;
use edgequake_llm::{EmbeddingProvider, ProviderFactory};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::debug;

/// Computes embeddings for a batch of texts.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Return exactly one vector per input text, in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, PdfRagError>;

    /// Embed a single query string.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, PdfRagError> {
        let mut vectors = self.embed(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| PdfRagError::EmbeddingFailed("no vector returned for query".into()))
    }
}

// ── Remote provider ──────────────────────────────────────────────────────────

/// [`Embedder`] backed by an edgequake-llm embedding provider.
pub struct ProviderEmbedder {
    provider: Arc<dyn EmbeddingProvider>,
}

impl ProviderEmbedder {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { provider }
    }

    /// Auto-detect the embedding provider from environment variables.
    pub fn from_env() -> Result<Self, PdfRagError> {
        let (_llm, embedding) =
            ProviderFactory::from_env().map_err(|e| PdfRagError::ProviderNotConfigured {
                provider: "embedding".to_string(),
                hint: format!(
                    "No embedding provider could be auto-detected from environment.\n\
                    Set OPENAI_API_KEY or use --embedder hashing for offline runs.\n\
                    Error: {}",
                    e
                ),
            })?;
        Ok(Self::new(embedding))
    }
}

#[async_trait]
impl Embedder for ProviderEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, PdfRagError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let vectors = self
            .provider
            .embed(texts)
            .await
            .map_err(|e| PdfRagError::EmbeddingFailed(e.to_string()))?;
        debug!("Embedded {} texts via provider", vectors.len());
        Ok(vectors)
    }
}

// ── Local feature hashing ────────────────────────────────────────────────────

static RE_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").unwrap());

/// Offline embedder: signed feature hashing of word tokens, L2-normalised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    /// Embed one text synchronously.
    pub fn encode(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0_f32; self.dimension];

        for token in RE_WORD.find_iter(text) {
            let h = fnv1a(token.as_str().to_lowercase().as_bytes());
            let slot = (h % self.dimension as u64) as usize;
            // High bit picks the sign so collisions tend to cancel out.
            let sign = if h >> 63 == 0 { 1.0 } else { -1.0 };
            v[slot] += sign;
        }

        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v {
                *x /= norm;
            }
        }
        v
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, PdfRagError> {
        Ok(texts.iter().map(|t| self.encode(t)).collect())
    }
}

/// 64-bit FNV-1a; stable across platforms and releases.
fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    bytes
        .iter()
        .fold(OFFSET, |h, b| (h ^ u64::from(*b)).wrapping_mul(PRIME))
}
