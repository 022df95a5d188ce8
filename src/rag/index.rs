use std::cmp::Ordering;

use crate::rag::chunker::Chunk;

/// One chunk with the vector it was embedded to. Created once at build time
/// and never reordered afterwards so similarity ties stay reproducible.
#[derive(Debug, Clone)]
pub struct IndexedEntry {
    pub vector: Vec<f32>,
    pub chunk: Chunk,
}

#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Top-k nearest-neighbor store for one session's corpus.
///
/// The indexing algorithm behind this interface is deliberately unspecified;
/// any library can sit behind it as one implementation.
pub trait VectorIndex: Send + Sync {
    /// Return up to `k` entries, best-first by similarity. Fewer than `k`
    /// entries means all of them; an empty index means an empty result.
    fn query(&self, vector: &[f32], k: usize) -> Vec<ScoredChunk>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Exhaustive cosine-similarity index held entirely in memory.
///
/// The session owns exactly one of these; it is discarded wholesale on reset.
/// Entries keep insertion order and the ranking sort is stable, so equal
/// scores resolve to the earlier-inserted chunk.
pub struct InMemoryVectorIndex {
    entries: Vec<IndexedEntry>,
}

impl InMemoryVectorIndex {
    pub fn build(entries: Vec<IndexedEntry>) -> Self {
        Self { entries }
    }
}

impl VectorIndex for InMemoryVectorIndex {
    fn query(&self, vector: &[f32], k: usize) -> Vec<ScoredChunk> {
        let mut scored: Vec<ScoredChunk> = self
            .entries
            .iter()
            .map(|entry| ScoredChunk {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(&entry.vector, vector),
            })
            .collect();

        // Stable sort keeps insertion order among ties.
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        scored.truncate(k);
        scored
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(vector: Vec<f32>, text: &str, sequence_index: usize) -> IndexedEntry {
        IndexedEntry {
            vector,
            chunk: Chunk {
                text: text.to_string(),
                source_id: "test.txt".to_string(),
                page_number: None,
                sequence_index,
            },
        }
    }

    #[test]
    fn ranks_by_descending_similarity() {
        let index = InMemoryVectorIndex::build(vec![
            entry(vec![0.0, 1.0], "orthogonal", 0),
            entry(vec![1.0, 0.0], "aligned", 1),
            entry(vec![1.0, 1.0], "diagonal", 2),
        ]);

        let results = index.query(&[1.0, 0.0], 3);
        assert_eq!(results[0].chunk.text, "aligned");
        assert_eq!(results[1].chunk.text, "diagonal");
        assert_eq!(results[2].chunk.text, "orthogonal");
        assert!(results[0].score >= results[1].score);
        assert!(results[1].score >= results[2].score);
    }

    #[test]
    fn ties_resolve_to_insertion_order() {
        let index = InMemoryVectorIndex::build(vec![
            entry(vec![1.0, 0.0], "first", 0),
            entry(vec![2.0, 0.0], "second", 1),
        ]);

        // Cosine similarity ignores magnitude: both score 1.0.
        let results = index.query(&[1.0, 0.0], 2);
        assert_eq!(results[0].chunk.text, "first");
        assert_eq!(results[1].chunk.text, "second");
    }

    #[test]
    fn returns_all_entries_when_k_exceeds_len() {
        let index = InMemoryVectorIndex::build(vec![entry(vec![1.0, 0.0], "only", 0)]);
        assert_eq!(index.query(&[1.0, 0.0], 10).len(), 1);
    }

    #[test]
    fn empty_index_returns_empty_result() {
        let index = InMemoryVectorIndex::build(Vec::new());
        assert!(index.query(&[1.0, 0.0], 5).is_empty());
        assert!(index.is_empty());
    }

    #[test]
    fn zero_vector_scores_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }
}
