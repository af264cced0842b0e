//! In-memory embedding index with cosine similarity search
//!
//! `build` is the one-time initialization barrier: it consumes the fragments,
//! embeds each one, and returns an immutable index. `search` takes `&self`
//! only, so a shared index can serve concurrent queries safely.

use crate::embedding::Embedder;
use crate::errors::{RagError, Result};
use crate::types::{Fragment, ScoredFragment};
use std::cmp::Ordering;

/// A fragment paired with its embedding vector
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub fragment: Fragment,
    pub vector: Vec<f32>,
}

/// Immutable fragment index keyed by vector similarity
#[derive(Debug)]
pub struct EmbeddingIndex {
    entries: Vec<IndexEntry>,
    dimension: usize,
    embed_model: String,
}

/// Progress callback invoked after each fragment is embedded:
/// (fragments done, fragments total)
pub type ProgressFn = Box<dyn FnMut(usize, usize) + Send>;

impl EmbeddingIndex {
    /// Embed every fragment and build the index.
    ///
    /// Fails fast on the first embedding failure, naming the failing
    /// fragment: a partially built index would silently degrade retrieval
    /// quality, so no partial index is ever returned.
    pub async fn build(fragments: Vec<Fragment>, embedder: &dyn Embedder) -> Result<Self> {
        Self::build_with_progress(fragments, embedder, None).await
    }

    /// `build` with an optional per-fragment progress callback
    pub async fn build_with_progress(
        fragments: Vec<Fragment>,
        embedder: &dyn Embedder,
        mut progress: Option<ProgressFn>,
    ) -> Result<Self> {
        let total = fragments.len();
        let mut entries = Vec::with_capacity(total);
        let mut dimension = 0;

        for fragment in fragments {
            let vector = match embedder.embed(&fragment.text).await {
                Ok(v) => v,
                Err(RagError::EmbeddingService { message, .. }) => {
                    return Err(RagError::EmbeddingService {
                        stage: format!("fragment {}", fragment.sequence_index),
                        message,
                    });
                }
                Err(e) => return Err(e),
            };

            if dimension == 0 {
                dimension = vector.len();
            } else if vector.len() != dimension {
                return Err(RagError::DimensionMismatch {
                    expected: dimension,
                    actual: vector.len(),
                });
            }

            entries.push(IndexEntry { fragment, vector });

            if let Some(ref mut callback) = progress {
                callback(entries.len(), total);
            }
        }

        Ok(Self {
            entries,
            dimension,
            embed_model: embedder.model().to_string(),
        })
    }

    /// Return the `k` entries most similar to `query_vector`.
    ///
    /// Results are ordered by descending cosine similarity; equal scores are
    /// broken by lower `sequence_index` so retrieval is deterministic.
    pub fn search(&self, query_vector: &[f32], k: usize) -> Result<Vec<ScoredFragment>> {
        if self.entries.is_empty() {
            return Err(RagError::EmptyIndex);
        }
        if k == 0 || k > self.entries.len() {
            return Err(RagError::InvalidTopK {
                k,
                index_size: self.entries.len(),
            });
        }
        if query_vector.len() != self.dimension {
            return Err(RagError::DimensionMismatch {
                expected: self.dimension,
                actual: query_vector.len(),
            });
        }

        let mut scored: Vec<ScoredFragment> = self
            .entries
            .iter()
            .map(|entry| ScoredFragment {
                fragment: entry.fragment.clone(),
                score: cosine_similarity(query_vector, &entry.vector),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.fragment.sequence_index.cmp(&b.fragment.sequence_index))
        });
        scored.truncate(k);

        Ok(scored)
    }

    /// Number of indexed fragments
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the index holds no fragments
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Vector dimension shared by all entries
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Embedding model the index was built with
    pub fn embed_model(&self) -> &str {
        &self.embed_model
    }
}

/// Cosine similarity between two vectors of equal length.
///
/// A zero-magnitude vector scores 0.0 against anything.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}
