//! HTTP client for the Ollama embeddings endpoint
//!
//! Endpoint: POST /api/embeddings with a model name and input text,
//! returning one fixed-length vector per call.

use crate::embedding::Embedder;
use crate::errors::{RagError, Result};
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default Ollama API endpoint
pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// Default embedding model
pub const DEFAULT_EMBED_MODEL: &str = "nomic-embed-text";

/// Request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Ollama embeddings client
#[derive(Debug, Clone)]
pub struct OllamaEmbeddingClient {
    client: Client,
    base_url: String,
    model: String,
    retry: RetryPolicy,
}

impl OllamaEmbeddingClient {
    /// Create a client with default endpoint and model
    pub fn new() -> Result<Self> {
        Self::with_config(DEFAULT_OLLAMA_URL, DEFAULT_EMBED_MODEL)
    }

    /// Create a client with custom endpoint and model
    pub fn with_config(base_url: &str, model: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(RagError::HttpError)?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            model: model.to_string(),
            retry: RetryPolicy::none(),
        })
    }

    /// Set the retry policy for embedding requests
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Get base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn request_embedding(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);

        let request = EmbeddingRequest {
            model: self.model.clone(),
            prompt: text.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| RagError::EmbeddingService {
                stage: "request".to_string(),
                message: format!("failed to reach {}: {}", url, e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(RagError::EmbeddingService {
                stage: "request".to_string(),
                message: format!("HTTP {}: {}", status, body),
            });
        }

        let parsed: EmbeddingResponse =
            response
                .json()
                .await
                .map_err(|e| RagError::EmbeddingService {
                    stage: "response".to_string(),
                    message: format!("failed to parse embedding: {}", e),
                })?;

        if parsed.embedding.is_empty() {
            return Err(RagError::EmbeddingService {
                stage: "response".to_string(),
                message: "service returned an empty vector".to_string(),
            });
        }

        // Ollama returns f64 components; similarity math runs on f32
        Ok(parsed.embedding.into_iter().map(|x| x as f32).collect())
    }
}

#[async_trait]
impl Embedder for OllamaEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.retry.execute(|| self.request_embedding(text)).await
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Ollama embeddings request body
#[derive(Debug, Clone, Serialize)]
struct EmbeddingRequest {
    model: String,
    prompt: String,
}

/// Ollama embeddings response body
#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f64>,
}
