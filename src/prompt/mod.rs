//! Prompt assembly from instructions, retrieved fragments, and the query
//!
//! The template and fragment separator are fixed: prompt layout affects
//! generation quality reproducibly, so two runs over the same retrieval
//! result must produce byte-identical prompts.

use crate::types::{Prompt, ScoredFragment};

/// Separator placed between fragment texts in the context section
pub const FRAGMENT_SEPARATOR: &str = "\n";

/// Default system instructions for question answering
pub const DEFAULT_INSTRUCTIONS: &str = "Answer the question using only the provided context. \
If the context does not contain the answer, say that you do not know.";

/// Assembles prompts from a fixed template
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    instructions: String,
}

impl PromptAssembler {
    /// Create an assembler with the default instructions
    pub fn new() -> Self {
        Self::with_instructions(DEFAULT_INSTRUCTIONS)
    }

    /// Create an assembler with custom instructions
    pub fn with_instructions(instructions: impl Into<String>) -> Self {
        Self {
            instructions: instructions.into(),
        }
    }

    /// Compose the prompt.
    ///
    /// Fragment texts are concatenated in the retrieval result's order
    /// (highest similarity first), joined by `FRAGMENT_SEPARATOR`, between
    /// the instructions and the question:
    ///
    /// ```text
    /// {instructions}
    ///
    /// Context:
    /// {fragments}
    ///
    /// Question: {query}
    /// Answer:
    /// ```
    pub fn assemble(&self, query: &str, results: &[ScoredFragment]) -> Prompt {
        let context = results
            .iter()
            .map(|r| r.fragment.text.as_str())
            .collect::<Vec<_>>()
            .join(FRAGMENT_SEPARATOR);

        let text = format!(
            "{}\n\nContext:\n{}\n\nQuestion: {}\nAnswer:",
            self.instructions, context, query
        );

        Prompt { text }
    }

    /// Current instructions
    pub fn instructions(&self) -> &str {
        &self.instructions
    }
}

impl Default for PromptAssembler {
    fn default() -> Self {
        Self::new()
    }
}
