//! Evaluation harness: run the pipeline over labeled cases and grade answers
//!
//! Graders are independent: each produces its own score per case and no
//! combined score is computed, since heuristic and model-graded criteria
//! are not commensurable. Aggregation, if any, is the caller's decision.

use crate::errors::{RagError, Result};
use crate::generation::Generator;
use crate::pipeline::QueryPipeline;
use crate::types::{Answer, Prompt};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// One labeled evaluation input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalCase {
    /// Question fed to the pipeline
    pub input: String,
    /// Reference answer
    pub expected: String,
}

/// Score produced by a single grader for a single case
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeScore {
    /// Grader that produced the score
    pub grader: String,
    /// Score in [0.0, 1.0]
    pub value: f32,
    /// Human-readable rationale
    pub detail: String,
}

/// Scores an answer against its case
#[async_trait]
pub trait Grader: Send + Sync {
    fn name(&self) -> &str;

    async fn grade(&self, case: &EvalCase, answer: &Answer) -> Result<GradeScore>;
}

/// Passes only when the answer equals the reference exactly (whitespace-trimmed)
pub struct ExactMatch;

#[async_trait]
impl Grader for ExactMatch {
    fn name(&self) -> &str {
        "exact_match"
    }

    async fn grade(&self, case: &EvalCase, answer: &Answer) -> Result<GradeScore> {
        let matched = answer.text.trim() == case.expected.trim();
        Ok(GradeScore {
            grader: self.name().to_string(),
            value: if matched { 1.0 } else { 0.0 },
            detail: if matched {
                "answer equals reference".to_string()
            } else {
                "answer differs from reference".to_string()
            },
        })
    }
}

/// Passes when the answer contains the reference, case-insensitively
pub struct ContainsExpected;

#[async_trait]
impl Grader for ContainsExpected {
    fn name(&self) -> &str {
        "contains_expected"
    }

    async fn grade(&self, case: &EvalCase, answer: &Answer) -> Result<GradeScore> {
        let contained = answer
            .text
            .to_lowercase()
            .contains(&case.expected.trim().to_lowercase());
        Ok(GradeScore {
            grader: self.name().to_string(),
            value: if contained { 1.0 } else { 0.0 },
            detail: if contained {
                "reference found in answer".to_string()
            } else {
                "reference not found in answer".to_string()
            },
        })
    }
}

/// Judges answer quality with the generation service on a 0-10 scale
pub struct LlmGrader {
    generator: Arc<dyn Generator>,
}

impl LlmGrader {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }

    fn judge_prompt(case: &EvalCase, answer: &Answer) -> Prompt {
        Prompt {
            text: format!(
                "Rate how well the candidate answer matches the reference answer \
                 on a scale from 0 to 10. Reply with only the number.\n\n\
                 Question: {}\nReference answer: {}\nCandidate answer: {}\nRating:",
                case.input, case.expected, answer.text
            ),
        }
    }

    /// Extract the leading 0-10 rating from the judge's reply
    fn parse_rating(reply: &str) -> Option<f32> {
        let token = reply
            .trim()
            .split(|c: char| !c.is_ascii_digit())
            .find(|t| !t.is_empty())?;
        let rating: u32 = token.parse().ok()?;
        if rating <= 10 {
            Some(rating as f32 / 10.0)
        } else {
            None
        }
    }
}

#[async_trait]
impl Grader for LlmGrader {
    fn name(&self) -> &str {
        "llm_judge"
    }

    async fn grade(&self, case: &EvalCase, answer: &Answer) -> Result<GradeScore> {
        let reply = self
            .generator
            .generate(&Self::judge_prompt(case, answer))
            .await?;

        let value = Self::parse_rating(&reply.text).ok_or_else(|| {
            RagError::GenerationService {
                message: format!("judge reply is not a 0-10 rating: {:?}", reply.text),
            }
        })?;

        Ok(GradeScore {
            grader: self.name().to_string(),
            value,
            detail: format!("judge replied {:?}", reply.text.trim()),
        })
    }
}

/// All grader outputs for one case
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseReport {
    pub case: EvalCase,
    pub answer: Answer,
    pub scores: Vec<GradeScore>,
}

/// Full evaluation run output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    /// Generation model the pipeline used
    pub model: String,
    pub cases: Vec<CaseReport>,
}

/// Drives the pipeline over cases and applies every grader
pub struct EvalRunner<'a> {
    pipeline: &'a QueryPipeline,
    graders: Vec<Box<dyn Grader>>,
}

impl<'a> EvalRunner<'a> {
    pub fn new(pipeline: &'a QueryPipeline, graders: Vec<Box<dyn Grader>>) -> Self {
        Self { pipeline, graders }
    }

    /// Answer and grade every case.
    ///
    /// A pipeline or grader failure aborts the run; no partial report is
    /// returned.
    pub async fn run(&self, cases: Vec<EvalCase>) -> Result<EvalReport> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let mut case_reports = Vec::with_capacity(cases.len());

        for case in cases {
            let answer = self.pipeline.answer_question(&case.input).await?;

            let mut scores = Vec::with_capacity(self.graders.len());
            for grader in &self.graders {
                scores.push(grader.grade(&case, &answer).await?);
            }

            case_reports.push(CaseReport {
                case,
                answer,
                scores,
            });
        }

        Ok(EvalReport {
            run_id,
            started_at,
            model: self.pipeline.model().to_string(),
            cases: case_reports,
        })
    }
}
