use std::sync::Arc;
use thiserror::Error;

use crate::providers::retry::with_retry;
use crate::providers::traits::EmbeddingProvider;
use crate::rag::index::VectorIndex;

#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("failed to embed query: {0}")]
    Embedding(String),
}

/// One retrieved chunk plus where it came from. `rank` is 1-based, best-first.
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    pub text: String,
    pub source_id: String,
    pub page_number: Option<u32>,
    pub rank: usize,
    pub score: f32,
}

#[derive(Debug, Clone, Default)]
pub struct RetrievalResult {
    pub hits: Vec<RetrievedChunk>,
}

impl RetrievalResult {
    pub fn context_texts(&self) -> Vec<String> {
        self.hits.iter().map(|hit| hit.text.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// Embeds a query once and shapes the index's top-k response.
///
/// An empty index is "no context available", not an error — only an embedding
/// failure surfaces as `RetrievalError`, and the pipelines catch that at
/// their own boundary.
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { embedder }
    }

    /// Plain retrieval: ranked context texts only.
    pub async fn retrieve(
        &self,
        index: &dyn VectorIndex,
        query: &str,
        k: usize,
    ) -> Result<Vec<String>, RetrievalError> {
        Ok(self
            .retrieve_with_metadata(index, query, k)
            .await?
            .context_texts())
    }

    /// Same ranking, but source and page metadata preserved per entry.
    /// Used by the citations mode.
    pub async fn retrieve_with_metadata(
        &self,
        index: &dyn VectorIndex,
        query: &str,
        k: usize,
    ) -> Result<RetrievalResult, RetrievalError> {
        if index.is_empty() {
            return Ok(RetrievalResult::default());
        }

        let vector = with_retry("query embedding", || self.embedder.embed(query))
            .await
            .map_err(|e| RetrievalError::Embedding(e.to_string()))?;

        let hits = index
            .query(&vector, k)
            .into_iter()
            .enumerate()
            .map(|(i, scored)| RetrievedChunk {
                text: scored.chunk.text,
                source_id: scored.chunk.source_id,
                page_number: scored.chunk.page_number,
                rank: i + 1,
                score: scored.score,
            })
            .collect();

        Ok(RetrievalResult { hits })
    }
}
