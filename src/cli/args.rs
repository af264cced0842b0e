//! Command-line argument parsing
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// docrag - Ask questions about a document with a local Ollama model
#[derive(Parser, Debug)]
#[command(name = "docrag")]
#[command(version)]
#[command(about = "Retrieval-augmented question answering over local Ollama models", long_about = None)]
pub struct Args {
    /// Question to ask about the document
    #[arg(value_name = "QUESTION")]
    pub question: Option<String>,

    /// Document source: a URL or a local file path
    #[arg(short, long)]
    pub source: Option<String>,

    /// Generation model
    #[arg(short, long)]
    pub model: Option<String>,

    /// Embedding model
    #[arg(long)]
    pub embed_model: Option<String>,

    /// Ollama host
    #[arg(long)]
    pub host: Option<String>,

    /// Ollama port
    #[arg(long)]
    pub port: Option<u16>,

    /// Fragments retrieved per question
    #[arg(long)]
    pub top_k: Option<usize>,

    /// Maximum fragment size in characters
    #[arg(long)]
    pub max_fragment_chars: Option<usize>,

    /// Overlap between neighboring fragments in characters
    #[arg(long)]
    pub overlap_chars: Option<usize>,

    /// Stream tokens as they are generated
    #[arg(long)]
    pub stream: bool,

    /// Print the retrieved fragments alongside the answer
    #[arg(long)]
    pub show_context: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Verbosity level: default (normal), -v (verbose)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress all output except the answer)
    #[arg(short, long)]
    pub quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List models installed on the Ollama server
    Models,

    /// Display current configuration
    Config,
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else if self.verbose > 0 {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        }
    }

    /// Check that question and source are present when asking
    pub fn validate(&self) -> Result<(), String> {
        if self.command.is_some() {
            if self.question.is_some() {
                return Err("Cannot specify a question with a subcommand.".to_string());
            }
            return Ok(());
        }

        if self.question.is_none() {
            return Err(
                "Question required. Use 'docrag --source <URL-or-file> \"<question>\"'.".to_string(),
            );
        }
        if self.source.is_none() {
            return Err("Document source required. Pass --source <URL-or-file>.".to_string());
        }

        Ok(())
    }
}

impl Verbosity {
    /// Check if progress output should be shown
    pub fn show_progress(&self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ask_requires_question_and_source() {
        let args = Args::parse_from(["docrag"]);
        assert!(args.validate().is_err());

        let args = Args::parse_from(["docrag", "what?"]);
        assert!(args.validate().is_err());

        let args = Args::parse_from(["docrag", "--source", "doc.txt", "what?"]);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_subcommand_needs_no_question() {
        let args = Args::parse_from(["docrag", "models"]);
        assert!(matches!(args.command, Some(Commands::Models)));
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_verbosity_flags() {
        let args = Args::parse_from(["docrag", "-q", "models"]);
        assert_eq!(args.verbosity(), Verbosity::Quiet);
        assert!(!args.verbosity().show_progress());

        let args = Args::parse_from(["docrag", "-v", "models"]);
        assert_eq!(args.verbosity(), Verbosity::Verbose);
    }

    #[test]
    fn test_overrides_parse() {
        let args = Args::parse_from([
            "docrag",
            "--source",
            "https://example.com/a.txt",
            "--top-k",
            "6",
            "--max-fragment-chars",
            "500",
            "question text",
        ]);
        assert_eq!(args.top_k, Some(6));
        assert_eq!(args.max_fragment_chars, Some(500));
        assert_eq!(args.source.as_deref(), Some("https://example.com/a.txt"));
    }
}
