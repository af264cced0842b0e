//! Text embedding via the Ollama embeddings API
//!
//! The `Embedder` trait is the seam between the pipeline and the embedding
//! service: the index builder and the retriever both depend on it, which
//! keeps them testable and guarantees one embedding space for both sides
//! of a similarity comparison.

pub mod client;

pub use client::OllamaEmbeddingClient;

use crate::errors::Result;
use async_trait::async_trait;

/// Converts text into a fixed-dimension vector
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Name of the embedding model; the index records this so queries are
    /// never embedded with a different model than the fragments
    fn model(&self) -> &str;
}
