//! Answer generation via the Ollama generate API
//!
//! Components:
//! - `Generator`: the seam between the pipeline and the generation service
//! - `OllamaGenerationClient`: HTTP client for POST /api/generate
//! - `StreamParser`: incremental parser for the newline-delimited stream

pub mod client;
pub mod parser;

pub use client::OllamaGenerationClient;
pub use parser::StreamParser;

use crate::errors::Result;
use crate::types::{Answer, Prompt};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Produces a completion for an assembled prompt
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate the full completion for a prompt, returned verbatim
    async fn generate(&self, prompt: &Prompt) -> Result<Answer>;

    /// Name of the generation model
    fn model(&self) -> &str;
}

/// Sampling options forwarded to the generation service.
///
/// Unset fields are omitted from the request so the server applies its own
/// defaults. Stop sequences are trimmed by the server, not by this client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Context window limit; overlong prompts are truncated or rejected by
    /// the service, never by this pipeline
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_ctx: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: None,
            top_k: None,
            top_p: None,
            num_ctx: Some(4096),
            stop: None,
        }
    }
}
