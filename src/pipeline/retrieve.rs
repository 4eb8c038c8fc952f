//! Indexing and retrieval over a [`VectorStore`].
//!
//! [`Retriever`] owns the embedder and the store: chunks go in through
//! [`Retriever::index`], queries come out through [`Retriever::retrieve`].
//! Ranking is whatever the store's similarity search returns; nothing is
//! re-ranked here.

use crate::error::PdfRagError;
use crate::pipeline::chunk::Chunk;
use crate::pipeline::embed::Embedder;
use crate::pipeline::store::{ScoredChunk, VectorStore};
use std::sync::Arc;
use tracing::{debug, info};

pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    store: Box<dyn VectorStore>,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>, store: Box<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Embed every chunk and add it to the store.
    ///
    /// Fails if the embedder returns a different number of vectors than
    /// chunks: each chunk must map to exactly one embedding.
    pub async fn index(&mut self, chunks: Vec<Chunk>) -> Result<usize, PdfRagError> {
        if chunks.is_empty() {
            return Ok(0);
        }
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(PdfRagError::EmbeddingFailed(format!(
                "embedder returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        let n = chunks.len();
        self.store.add(chunks, embeddings).await?;
        info!(
            "Indexed {} chunks into collection '{}'",
            n,
            self.store.collection()
        );
        Ok(n)
    }

    /// Top-`k` chunks for `query`, most similar first.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>, PdfRagError> {
        let vector = self.embedder.embed_query(query).await?;
        let hits = self.store.similarity_search(&vector, k).await?;
        debug!(
            "Query {:?}: {} hits, best score {:?}",
            query,
            hits.len(),
            hits.first().map(|h| h.score)
        );
        Ok(hits)
    }
}
