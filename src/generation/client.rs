//! HTTP client for the Ollama generate endpoint
//!
//! Non-streaming generation posts with `stream: false` and returns the
//! completion verbatim. Streaming generation yields raw byte chunks of the
//! newline-delimited JSON stream; feed them to `StreamParser` to recover
//! response text incrementally.

use crate::errors::{RagError, Result};
use crate::generation::{GenerationOptions, Generator};
use crate::retry::RetryPolicy;
use crate::types::{Answer, Prompt};
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default Ollama API endpoint
pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// Default generation model
pub const DEFAULT_MODEL: &str = "qwen2.5:7b-instruct";

/// Default request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Ollama generation client
#[derive(Debug, Clone)]
pub struct OllamaGenerationClient {
    client: Client,
    base_url: String,
    model: String,
    options: GenerationOptions,
    retry: RetryPolicy,
    timeout: Duration,
}

impl OllamaGenerationClient {
    /// Create a client with default endpoint and model
    pub fn new() -> Result<Self> {
        Self::with_config(DEFAULT_OLLAMA_URL, DEFAULT_MODEL)
    }

    /// Create a client with custom endpoint and model
    pub fn with_config(base_url: &str, model: &str) -> Result<Self> {
        Self::builder(base_url, model, GenerationOptions::default(), RetryPolicy::none(), DEFAULT_TIMEOUT)
    }

    /// Create a fully configured client
    pub fn builder(
        base_url: &str,
        model: &str,
        options: GenerationOptions,
        retry: RetryPolicy,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(RagError::HttpError)?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            model: model.to_string(),
            options,
            retry,
            timeout,
        })
    }

    /// Replace the sampling options
    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Get base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Current sampling options
    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }

    async fn request_completion(&self, prompt: &Prompt) -> Result<Answer> {
        let url = format!("{}/api/generate", self.base_url);

        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: prompt.text.clone(),
            stream: false,
            options: self.options.clone(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RagError::Timeout {
                        duration_ms: self.timeout.as_millis() as u64,
                    }
                } else {
                    RagError::GenerationService {
                        message: format!("failed to reach {}: {}", url, e),
                    }
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(RagError::GenerationService {
                message: format!("HTTP {}: {}", status, body),
            });
        }

        let parsed: GenerateResponse =
            response
                .json()
                .await
                .map_err(|e| RagError::GenerationService {
                    message: format!("failed to parse completion: {}", e),
                })?;

        Ok(Answer {
            text: parsed.response,
            model: self.model.clone(),
        })
    }

    /// Stream the completion as raw byte chunks.
    ///
    /// The stream carries newline-delimited JSON objects; use `StreamParser`
    /// to turn chunks into response text.
    pub async fn generate_stream(
        &self,
        prompt: &Prompt,
    ) -> Result<impl futures_util::Stream<Item = Result<Vec<u8>>>> {
        let url = format!("{}/api/generate", self.base_url);

        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: prompt.text.clone(),
            stream: true,
            options: self.options.clone(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| RagError::GenerationService {
                message: format!("failed to reach {}: {}", url, e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(RagError::GenerationService {
                message: format!("HTTP {}: {}", status, body),
            });
        }

        let stream = response.bytes_stream().map(|result| {
            result.map(|bytes| bytes.to_vec()).map_err(|e| {
                RagError::GenerationService {
                    message: format!("stream error: {}", e),
                }
            })
        });

        Ok(stream)
    }

    /// Check whether the Ollama server responds
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/version", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    /// List models installed on the server
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RagError::GenerationService {
                message: format!("failed to list models: {}", e),
            })?;

        if !response.status().is_success() {
            return Err(RagError::GenerationService {
                message: format!("failed to retrieve model list: HTTP {}", response.status()),
            });
        }

        let models_response: ModelsResponse =
            response
                .json()
                .await
                .map_err(|e| RagError::GenerationService {
                    message: format!("failed to parse model list: {}", e),
                })?;

        Ok(models_response.models.into_iter().map(|m| m.name).collect())
    }
}

#[async_trait]
impl Generator for OllamaGenerationClient {
    async fn generate(&self, prompt: &Prompt) -> Result<Answer> {
        self.retry.execute(|| self.request_completion(prompt)).await
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Ollama generate request body
#[derive(Debug, Clone, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: GenerationOptions,
}

/// Ollama generate response body (non-streaming)
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Ollama models list response
#[derive(Debug, Deserialize)]
struct ModelsResponse {
    models: Vec<ModelInfo>,
}

/// Model information
#[derive(Debug, Deserialize)]
struct ModelInfo {
    name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = OllamaGenerationClient::new().unwrap();
        assert_eq!(client.model(), DEFAULT_MODEL);
        assert_eq!(client.base_url(), DEFAULT_OLLAMA_URL);
    }

    #[test]
    fn test_client_with_config() {
        let client =
            OllamaGenerationClient::with_config("http://localhost:11434", "llama3.1:8b").unwrap();
        assert_eq!(client.model(), "llama3.1:8b");
    }

    #[test]
    fn test_request_serialization() {
        let request = GenerateRequest {
            model: "m".to_string(),
            prompt: "p".to_string(),
            stream: false,
            options: GenerationOptions {
                temperature: Some(0.1),
                stop: Some(vec!["</s>".to_string()]),
                ..Default::default()
            },
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains(r#""stream":false"#));
        assert!(json.contains(r#""temperature":0.1"#));
        assert!(json.contains("</s>"));
    }

    #[test]
    fn test_response_parsing() {
        let json = r#"{"model": "m", "response": "The answer.", "done": true}"#;
        let parsed: GenerateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.response, "The answer.");
    }

    #[tokio::test]
    #[ignore] // Requires Ollama running
    async fn test_generate_integration() {
        let client = OllamaGenerationClient::new().unwrap();
        let prompt = Prompt {
            text: "Say hello.".to_string(),
        };
        let answer = client.generate(&prompt).await.unwrap();
        assert!(!answer.text.is_empty());
    }

    #[tokio::test]
    #[ignore] // Requires Ollama running
    async fn test_health_check_integration() {
        let client = OllamaGenerationClient::new().unwrap();
        assert!(client.health_check().await.unwrap());
    }
}
