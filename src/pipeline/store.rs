//! Vector store: chunk embeddings indexed for nearest-neighbour lookup.
//!
//! [`InMemoryVectorStore`] is a named collection searched by brute-force
//! cosine similarity. It lives for one pipeline run; nothing is persisted.

use crate::error::PdfRagError;
use crate::pipeline::chunk::Chunk;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

/// A chunk returned by similarity search with its score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    /// Cosine similarity to the query, in `[-1, 1]`.
    pub score: f32,
}

/// Stores chunk embeddings and answers top-k similarity queries.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Collection name.
    fn collection(&self) -> &str;

    /// Number of stored chunks.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Store `chunks[i]` under `embeddings[i]`. Lengths must match.
    async fn add(&mut self, chunks: Vec<Chunk>, embeddings: Vec<Vec<f32>>)
        -> Result<(), PdfRagError>;

    /// Return up to `k` chunks ordered by descending similarity.
    async fn similarity_search(&self, query: &[f32], k: usize)
        -> Result<Vec<ScoredChunk>, PdfRagError>;
}

struct Entry {
    chunk: Chunk,
    embedding: Vec<f32>,
}

/// Brute-force cosine-similarity store held in memory.
pub struct InMemoryVectorStore {
    collection: String,
    dimension: Option<usize>,
    entries: Vec<Entry>,
}

impl InMemoryVectorStore {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            dimension: None,
            entries: Vec::new(),
        }
    }

    /// Dimension fixed by the first stored vector.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    fn check_dimension(&self, actual: usize) -> Result<(), PdfRagError> {
        match self.dimension {
            Some(expected) if expected != actual => Err(PdfRagError::DimensionMismatch {
                collection: self.collection.clone(),
                expected,
                actual,
            }),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    fn collection(&self) -> &str {
        &self.collection
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    async fn add(
        &mut self,
        chunks: Vec<Chunk>,
        embeddings: Vec<Vec<f32>>,
    ) -> Result<(), PdfRagError> {
        if chunks.len() != embeddings.len() {
            return Err(PdfRagError::EmbeddingFailed(format!(
                "{} chunks but {} embeddings",
                chunks.len(),
                embeddings.len()
            )));
        }

        // Validate the whole batch before inserting anything.
        let batch_dim = embeddings.first().map(Vec::len);
        if let Some(dim) = batch_dim {
            self.check_dimension(dim)?;
            if let Some(bad) = embeddings.iter().find(|e| e.len() != dim) {
                return Err(PdfRagError::DimensionMismatch {
                    collection: self.collection.clone(),
                    expected: dim,
                    actual: bad.len(),
                });
            }
            self.dimension = Some(dim);
        }

        self.entries.extend(
            chunks
                .into_iter()
                .zip(embeddings)
                .map(|(chunk, embedding)| Entry { chunk, embedding }),
        );
        debug!(
            "Collection '{}' now holds {} chunks",
            self.collection,
            self.entries.len()
        );
        Ok(())
    }

    async fn similarity_search(
        &self,
        query: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredChunk>, PdfRagError> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        self.check_dimension(query.len())?;

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (i, cosine_similarity(query, &e.embedding)))
            .collect();
        // Stable: ties keep insertion order.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(i, score)| ScoredChunk {
                chunk: self.entries[i].chunk.clone(),
                score,
            })
            .collect())
    }
}

/// Cosine similarity; 0.0 for mismatched lengths or zero vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot_product = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;

    for (x, y) in a.iter().zip(b.iter()) {
        dot_product += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denominator = (norm_a * norm_b).sqrt();
    if denominator == 0.0 {
        return 0.0;
    }

    dot_product / denominator
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn chunk(index: usize, text: &str) -> Chunk {
        Chunk {
            id: Uuid::new_v4(),
            index,
            text: text.to_string(),
            start_char: 0,
            end_char: text.chars().count(),
            source: "doc.pdf".to_string(),
        }
    }

    #[test]
    fn cosine_basics() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[tokio::test]
    async fn search_orders_by_similarity() {
        let mut store = InMemoryVectorStore::new("pdf_chunks");
        store
            .add(
                vec![chunk(0, "x"), chunk(1, "y"), chunk(2, "xy")],
                vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.7, 0.7]],
            )
            .await
            .unwrap();

        let hits = store.similarity_search(&[0.0, 1.0], 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk.text, "y");
        assert_eq!(hits[1].chunk.text, "xy");
        assert!(hits[0].score >= hits[1].score);
    }

    #[tokio::test]
    async fn ties_keep_insertion_order() {
        let mut store = InMemoryVectorStore::new("c");
        store
            .add(
                vec![chunk(0, "first"), chunk(1, "second")],
                vec![vec![1.0, 0.0], vec![1.0, 0.0]],
            )
            .await
            .unwrap();
        let hits = store.similarity_search(&[1.0, 0.0], 1).await.unwrap();
        assert_eq!(hits[0].chunk.text, "first");
    }

    #[tokio::test]
    async fn empty_store_returns_nothing() {
        let store = InMemoryVectorStore::new("c");
        assert!(store.similarity_search(&[1.0], 1).await.unwrap().is_empty());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn count_mismatch_is_rejected() {
        let mut store = InMemoryVectorStore::new("c");
        let err = store
            .add(vec![chunk(0, "a"), chunk(1, "b")], vec![vec![1.0]])
            .await
            .unwrap_err();
        assert!(matches!(err, PdfRagError::EmbeddingFailed(_)));
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn dimension_is_enforced() {
        let mut store = InMemoryVectorStore::new("c");
        store.add(vec![chunk(0, "a")], vec![vec![1.0, 0.0]]).await.unwrap();
        assert_eq!(store.dimension(), Some(2));

        let err = store
            .add(vec![chunk(1, "b")], vec![vec![1.0, 0.0, 0.0]])
            .await
            .unwrap_err();
        assert!(matches!(err, PdfRagError::DimensionMismatch { .. }));

        let err = store.similarity_search(&[1.0], 1).await.unwrap_err();
        assert!(matches!(err, PdfRagError::DimensionMismatch { .. }));
    }
}
