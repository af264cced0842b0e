//! Integration tests against a live Ollama server.
//!
//! All tests are ignored by default; run them with a server up and the
//! default models pulled:
//!
//! ```text
//! ollama serve
//! ollama pull qwen2.5:7b-instruct
//! ollama pull nomic-embed-text
//! cargo test -- --ignored
//! ```

use std::sync::Arc;

use docrag::embedding::OllamaEmbeddingClient;
use docrag::generation::OllamaGenerationClient;
use docrag::index::EmbeddingIndex;
use docrag::ingest::{DocumentIngestor, DocumentSource};
use docrag::pipeline::QueryPipeline;
use docrag::prompt::PromptAssembler;
use docrag::retrieval::{Retriever, SearchParams};

const STORY: &str =
    "Alice met Bob. Bob greeted Alice warmly. They talked about the weather.";

#[tokio::test]
#[ignore] // Requires Ollama running
async fn test_server_reachable() {
    let client = OllamaGenerationClient::new().unwrap();
    assert!(client.health_check().await.unwrap());
}

#[tokio::test]
#[ignore] // Requires Ollama running with nomic-embed-text pulled
async fn test_embeddings_have_stable_dimension() {
    let client = OllamaEmbeddingClient::new().unwrap();

    use docrag::embedding::Embedder;
    let a = client.embed("first text").await.unwrap();
    let b = client.embed("second text").await.unwrap();
    assert_eq!(a.len(), b.len());
    assert!(!a.is_empty());
}

#[tokio::test]
#[ignore] // Requires Ollama running with both default models pulled
async fn test_full_pipeline_against_live_server() {
    let embedder = Arc::new(OllamaEmbeddingClient::new().unwrap());
    let generator = Arc::new(OllamaGenerationClient::new().unwrap());

    let ingestor = DocumentIngestor::new(40, 10).unwrap();
    let fragments = ingestor
        .ingest(&DocumentSource::Text(STORY.to_string()))
        .await
        .unwrap();
    assert!(fragments.len() >= 2);

    let index = EmbeddingIndex::build(fragments, embedder.as_ref())
        .await
        .unwrap();
    let top_k = 2.min(index.len());
    let retriever =
        Retriever::with_params(Arc::new(index), embedder, SearchParams { top_k }).unwrap();

    let pipeline = QueryPipeline::new(retriever, PromptAssembler::new(), generator);

    let outcome = pipeline.answer_with_context("What did Bob do?").await.unwrap();
    assert!(!outcome.answer.text.is_empty());
    assert!(outcome
        .retrieved
        .iter()
        .any(|r| r.fragment.text.contains("greeted")));
}
