use anyhow::Result;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::config::{ConfigError, RagConfig};
use crate::providers::retry::with_retry;
use crate::providers::traits::EmbeddingProvider;
use crate::rag::chunker::Chunker;
use crate::rag::index::{InMemoryVectorIndex, IndexedEntry};

const EMBEDDING_CACHE_SIZE: usize = 1024;

#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("failed to read {path}: {reason}")]
    Read { path: String, reason: String },
    #[error("failed to extract text from {path}: {reason}")]
    Extraction { path: String, reason: String },
    #[error("unsupported file type: {path}")]
    Unsupported { path: String },
}

/// One extracted page: the unit the chunker consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct PageText {
    pub text: String,
    pub source_id: String,
    /// 1-based page for paged formats, absent for plain text files.
    pub page_number: Option<u32>,
}

/// What one ingestion pass produced. Failed documents are skipped, named
/// here, and never abort the rest of the batch.
#[derive(Debug, Default)]
pub struct IngestionReport {
    pub documents: usize,
    pub pages: usize,
    pub chunks: usize,
    pub failures: Vec<IngestionError>,
}

/// Extracts `{text, page, source}` records from files on disk.
///
/// PDF extraction goes through `pdf-extract` page by page; `.txt` and `.md`
/// files load as a single unpaged document.
pub struct DocumentLoader;

impl DocumentLoader {
    pub fn load_pages(&self, path: &str) -> Result<Vec<PageText>, IngestionError> {
        let source_id = Path::new(path)
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string());

        let extension = Path::new(path)
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "pdf" => {
                let pages = pdf_extract::extract_text_by_pages(path).map_err(|e| {
                    IngestionError::Extraction {
                        path: path.to_string(),
                        reason: e.to_string(),
                    }
                })?;
                Ok(pages
                    .into_iter()
                    .enumerate()
                    .map(|(i, text)| PageText {
                        text,
                        source_id: source_id.clone(),
                        page_number: Some(i as u32 + 1),
                    })
                    .collect())
            }
            "txt" | "md" => {
                let text = std::fs::read_to_string(path).map_err(|e| IngestionError::Read {
                    path: path.to_string(),
                    reason: e.to_string(),
                })?;
                Ok(vec![PageText {
                    text,
                    source_id,
                    page_number: None,
                }])
            }
            _ => Err(IngestionError::Unsupported {
                path: path.to_string(),
            }),
        }
    }
}

/// One sequential pass: files → pages → chunks → embeddings → index.
///
/// Chunking is deterministic, so ingesting the same set twice builds
/// identical chunk sequences. Embeddings are cached by chunk text, which
/// makes a re-ingest of unchanged material skip its provider calls.
pub struct Ingestor {
    loader: DocumentLoader,
    chunker: Chunker,
    embedder: Arc<dyn EmbeddingProvider>,
    embedding_cache: Mutex<LruCache<String, Vec<f32>>>,
}

impl Ingestor {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, config: &RagConfig) -> Result<Self, ConfigError> {
        let chunker = Chunker::new(config.chunk_size, config.chunk_overlap)?;
        let cache_size = NonZeroUsize::new(EMBEDDING_CACHE_SIZE)
            .unwrap_or(NonZeroUsize::MIN);
        Ok(Self {
            loader: DocumentLoader,
            chunker,
            embedder,
            embedding_cache: Mutex::new(LruCache::new(cache_size)),
        })
    }

    /// Ingest a batch of files into a fresh index.
    ///
    /// A document that fails extraction is recorded in the report and
    /// skipped; an embedding failure (after one retry) aborts the build and
    /// leaves the caller's session untouched.
    pub async fn build_index(
        &self,
        paths: &[String],
    ) -> Result<(InMemoryVectorIndex, IngestionReport)> {
        let mut report = IngestionReport::default();
        let mut pages: Vec<PageText> = Vec::new();

        for path in paths {
            match self.loader.load_pages(path) {
                Ok(loaded) => {
                    report.documents += 1;
                    report.pages += loaded.len();
                    pages.extend(loaded);
                }
                Err(e) => {
                    log::warn!("skipping document: {}", e);
                    report.failures.push(e);
                }
            }
        }

        let chunks = self.chunker.chunk(&pages);
        report.chunks = chunks.len();

        let mut entries = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let vector = self.embed_cached(&chunk.text).await?;
            entries.push(IndexedEntry { vector, chunk });
        }

        Ok((InMemoryVectorIndex::build(entries), report))
    }

    async fn embed_cached(&self, text: &str) -> Result<Vec<f32>> {
        if let Ok(mut cache) = self.embedding_cache.lock() {
            if let Some(vector) = cache.get(text) {
                return Ok(vector.clone());
            }
        }

        let vector = with_retry("chunk embedding", || self.embedder.embed(text)).await?;

        if let Ok(mut cache) = self.embedding_cache.lock() {
            cache.put(text.to_string(), vector.clone());
        }
        Ok(vector)
    }
}
