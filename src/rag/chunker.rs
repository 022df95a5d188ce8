use serde::{Deserialize, Serialize};
use tiktoken_rs::{cl100k_base, CoreBPE};

use crate::config::ConfigError;
use crate::ingestion::PageText;

/// A bounded contiguous text segment, the unit of retrieval.
///
/// Immutable once produced; the vector index owns chunks after ingestion and
/// never mutates or reorders them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub source_id: String,
    pub page_number: Option<u32>,
    /// 0-based, monotonic across the whole corpus in document order.
    pub sequence_index: usize,
}

/// Splits extracted document text into overlapping token windows.
///
/// Windows are `chunk_size` tokens wide with `chunk_overlap` tokens shared
/// between consecutive windows of the same document, counted with the
/// `cl100k_base` encoding so the same input always produces the same
/// boundaries. Chunks never span document boundaries.
pub struct Chunker {
    bpe: CoreBPE,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Chunker {
    /// Fails fast on `chunk_overlap >= chunk_size`: that configuration would
    /// never advance the window and emit duplicate chunks forever.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, ConfigError> {
        if chunk_size == 0 {
            return Err(ConfigError::ZeroParameter { name: "chunk_size" });
        }
        if chunk_overlap >= chunk_size {
            return Err(ConfigError::InvalidChunking {
                size: chunk_size,
                overlap: chunk_overlap,
            });
        }
        let bpe = cl100k_base().map_err(|e| ConfigError::Tokenizer(e.to_string()))?;
        Ok(Self {
            bpe,
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn token_count(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }

    /// Split each document into token windows. Empty documents produce no
    /// chunks; a document shorter than one window produces exactly one chunk
    /// equal to the whole document.
    pub fn chunk(&self, documents: &[PageText]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut sequence_index = 0;

        for document in documents {
            let tokens = self.bpe.encode_ordinary(&document.text);
            if tokens.is_empty() {
                continue;
            }

            let mut start = 0;
            loop {
                let end = (start + self.chunk_size).min(tokens.len());
                let text = match self.bpe.decode(tokens[start..end].to_vec()) {
                    Ok(text) => text,
                    Err(e) => {
                        log::warn!(
                            "skipping undecodable window in {}: {}",
                            document.source_id,
                            e
                        );
                        String::new()
                    }
                };

                if !text.is_empty() {
                    chunks.push(Chunk {
                        text,
                        source_id: document.source_id.clone(),
                        page_number: document.page_number,
                        sequence_index,
                    });
                    sequence_index += 1;
                }

                if end == tokens.len() {
                    break;
                }
                start += self.chunk_size - self.chunk_overlap;
            }
        }

        chunks
    }
}
