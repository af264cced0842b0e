//! End-to-end query pipeline: retrieve, assemble, generate
//!
//! All dependencies are injected through the constructor; there is no
//! process-wide state. The orchestrator runs the stages strictly in
//! sequence and surfaces any stage error unmodified.

use crate::errors::Result;
use crate::generation::Generator;
use crate::prompt::PromptAssembler;
use crate::retrieval::Retriever;
use crate::types::{Answer, Prompt, RetrievalResult};
use std::sync::Arc;

/// Answer plus the fragments it was conditioned on
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub answer: Answer,
    pub retrieved: RetrievalResult,
}

/// Question-in, answer-out orchestrator over a built index
pub struct QueryPipeline {
    retriever: Retriever,
    assembler: PromptAssembler,
    generator: Arc<dyn Generator>,
}

impl QueryPipeline {
    /// Wire the three stages together
    pub fn new(
        retriever: Retriever,
        assembler: PromptAssembler,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self {
            retriever,
            assembler,
            generator,
        }
    }

    /// Answer a question about the indexed document.
    ///
    /// The sole externally meaningful entry point: either a full answer is
    /// produced or an error from one of the stages is returned; there is no
    /// degraded mode.
    pub async fn answer_question(&self, query: &str) -> Result<Answer> {
        Ok(self.answer_with_context(query).await?.answer)
    }

    /// Answer a question and keep the retrieved fragments for provenance
    pub async fn answer_with_context(&self, query: &str) -> Result<PipelineOutcome> {
        let retrieved = self.retriever.retrieve(query).await?;
        let prompt = self.assembler.assemble(query, &retrieved);
        let answer = self.generator.generate(&prompt).await?;

        Ok(PipelineOutcome { answer, retrieved })
    }

    /// Run only the retrieval and assembly stages.
    ///
    /// Used by callers that drive generation themselves, e.g. to stream
    /// tokens to a terminal.
    pub async fn assemble_prompt(&self, query: &str) -> Result<(Prompt, RetrievalResult)> {
        let retrieved = self.retriever.retrieve(query).await?;
        let prompt = self.assembler.assemble(query, &retrieved);
        Ok((prompt, retrieved))
    }

    /// Model used for generation
    pub fn model(&self) -> &str {
        self.generator.model()
    }

    /// The retrieval stage
    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::Embedder;
    use crate::errors::RagError;
    use crate::index::EmbeddingIndex;
    use crate::retrieval::SearchParams;
    use crate::types::{Fragment, Prompt};
    use async_trait::async_trait;

    /// Embeds by position of a marker word; deterministic and offline
    struct WordCountEmbedder;

    #[async_trait]
    impl Embedder for WordCountEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let lower = text.to_lowercase();
            Ok(vec![
                lower.matches("alpha").count() as f32,
                lower.matches("beta").count() as f32,
                1.0,
            ])
        }

        fn model(&self) -> &str {
            "word-count"
        }
    }

    /// Generator that echoes the prompt back, prefixed
    struct EchoGenerator;

    #[async_trait]
    impl Generator for EchoGenerator {
        async fn generate(&self, prompt: &Prompt) -> Result<Answer> {
            Ok(Answer {
                text: format!("ECHO: {}", prompt.text),
                model: "echo".to_string(),
            })
        }

        fn model(&self) -> &str {
            "echo"
        }
    }

    async fn build_pipeline() -> QueryPipeline {
        let embedder = Arc::new(WordCountEmbedder);
        let fragments = vec![
            Fragment {
                text: "alpha facts live here".to_string(),
                source_offset: 0,
                sequence_index: 0,
            },
            Fragment {
                text: "beta facts live here".to_string(),
                source_offset: 21,
                sequence_index: 1,
            },
        ];
        let index = EmbeddingIndex::build(fragments, embedder.as_ref())
            .await
            .unwrap();
        let retriever = Retriever::with_params(
            Arc::new(index),
            embedder,
            SearchParams { top_k: 1 },
        )
        .unwrap();

        QueryPipeline::new(
            retriever,
            PromptAssembler::with_instructions("SYS"),
            Arc::new(EchoGenerator),
        )
    }

    #[tokio::test]
    async fn test_answer_question_flows_through_stages() {
        let pipeline = build_pipeline().await;

        let answer = pipeline.answer_question("tell me about alpha").await.unwrap();
        assert!(answer.text.starts_with("ECHO: SYS"));
        assert!(answer.text.contains("alpha facts live here"));
        assert!(!answer.text.contains("beta facts"));
    }

    #[tokio::test]
    async fn test_answer_with_context_returns_fragments() {
        let pipeline = build_pipeline().await;

        let outcome = pipeline
            .answer_with_context("anything about beta")
            .await
            .unwrap();
        assert_eq!(outcome.retrieved.len(), 1);
        assert_eq!(outcome.retrieved[0].fragment.text, "beta facts live here");
    }

    #[tokio::test]
    async fn test_assemble_prompt_skips_generation() {
        let pipeline = build_pipeline().await;

        let (prompt, retrieved) = pipeline.assemble_prompt("alpha?").await.unwrap();
        assert!(prompt.text.contains("alpha facts live here"));
        assert_eq!(retrieved.len(), 1);
        assert!(prompt.text.ends_with("Answer:"));
    }

    #[tokio::test]
    async fn test_empty_index_error_surfaces_end_to_end() {
        let embedder = Arc::new(WordCountEmbedder);
        let index = EmbeddingIndex::build(vec![], embedder.as_ref())
            .await
            .unwrap();
        let retriever = Retriever::new(Arc::new(index), embedder).unwrap();
        let pipeline = QueryPipeline::new(
            retriever,
            PromptAssembler::new(),
            Arc::new(EchoGenerator),
        );

        let result = pipeline.answer_question("anything").await;
        assert!(matches!(result, Err(RagError::EmptyIndex)));
    }
}
