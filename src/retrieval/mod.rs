//! Query-side retrieval over a shared embedding index
//!
//! The retriever embeds a query with the same embedder the index was built
//! with and returns the top-K fragments. Mixing embedding models across the
//! two sides invalidates similarity scores, so the constructor rejects an
//! embedder whose model differs from the one recorded in the index.

use crate::embedding::Embedder;
use crate::errors::{RagError, Result};
use crate::index::EmbeddingIndex;
use crate::types::RetrievalResult;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Search parameters for retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchParams {
    /// Maximum number of fragments to retrieve
    pub top_k: usize,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self { top_k: 4 }
    }
}

/// Retrieves the fragments most similar to a query
pub struct Retriever {
    index: Arc<EmbeddingIndex>,
    embedder: Arc<dyn Embedder>,
    default_params: SearchParams,
}

impl Retriever {
    /// Create a retriever over a built index.
    ///
    /// Fails with a configuration error if the embedder's model does not
    /// match the model the index was built with.
    pub fn new(index: Arc<EmbeddingIndex>, embedder: Arc<dyn Embedder>) -> Result<Self> {
        Self::with_params(index, embedder, SearchParams::default())
    }

    /// Create with custom default search parameters
    pub fn with_params(
        index: Arc<EmbeddingIndex>,
        embedder: Arc<dyn Embedder>,
        params: SearchParams,
    ) -> Result<Self> {
        if embedder.model() != index.embed_model() {
            return Err(RagError::ConfigError(format!(
                "query embedder '{}' does not match index embedder '{}'",
                embedder.model(),
                index.embed_model()
            )));
        }

        Ok(Self {
            index,
            embedder,
            default_params: params,
        })
    }

    /// Retrieve fragments for a query with the default parameters
    pub async fn retrieve(&self, query: &str) -> Result<RetrievalResult> {
        self.retrieve_with_params(query, &self.default_params).await
    }

    /// Retrieve fragments for a query with explicit parameters
    pub async fn retrieve_with_params(
        &self,
        query: &str,
        params: &SearchParams,
    ) -> Result<RetrievalResult> {
        let query_vector = match self.embedder.embed(query).await {
            Ok(v) => v,
            Err(RagError::EmbeddingService { message, .. }) => {
                return Err(RagError::EmbeddingService {
                    stage: "query".to_string(),
                    message,
                });
            }
            Err(e) => return Err(e),
        };

        self.index.search(&query_vector, params.top_k)
    }

    /// Default search parameters
    pub fn default_params(&self) -> &SearchParams {
        &self.default_params
    }

    /// The shared index being searched
    pub fn index(&self) -> &EmbeddingIndex {
        &self.index
    }
}
