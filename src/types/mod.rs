//! Core data types shared across pipeline stages
//!
//! All offsets and size bounds are measured in characters (Unicode scalar
//! values), never bytes, so fragment boundaries are always valid text.

use serde::{Deserialize, Serialize};

/// A contiguous slice of source text used as a retrieval unit.
///
/// Immutable after ingestion; owned by the embedding index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    /// Fragment text, including the overlap repeated from its predecessor
    pub text: String,
    /// Offset of the first character within the source document
    pub source_offset: usize,
    /// Position in ingestion order, starting at 0
    pub sequence_index: usize,
}

/// A fragment paired with its similarity score for one query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredFragment {
    pub fragment: Fragment,
    pub score: f32,
}

/// Ordered retrieval output: descending score, length bounded by top-k
pub type RetrievalResult = Vec<ScoredFragment>;

/// A fully assembled model input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub text: String,
}

/// Completion returned by the generation service, verbatim
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    /// Model that produced the completion
    pub model: String,
}
