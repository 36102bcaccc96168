//! Answer grading seam.
//!
//! Grading is an external, asynchronous, fallible concern (in production an
//! AI call); the engine only sees the [`Grader`] trait. The rating crosses
//! the boundary as a plain integer in 1..=4 and is validated by the session
//! before it can touch scheduling state.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Grading outcome for one submitted answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradedAnswer {
    /// Recall quality, 1 (Again) through 4 (Easy).
    pub rating: i64,
    pub feedback: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraderError {
    #[error("grader unavailable: {0}")]
    Unavailable(String),
    #[error("malformed grader response: {0}")]
    Malformed(String),
    #[error("empty answer")]
    EmptyAnswer,
}

/// Turns (question, reference answer, user answer) into a rating plus
/// feedback text. A stalled call must be bounded by the implementation and
/// reported as an error; the engine has no timeout of its own.
#[async_trait]
pub trait Grader: Send + Sync {
    async fn evaluate(
        &self,
        question: &str,
        reference_answer: &str,
        user_answer: &str,
    ) -> Result<GradedAnswer, GraderError>;
}

// ==================== Lexical reference grader ====================

/// Deterministic grader scoring answers by token overlap with the
/// reference. Stands in for the AI grader in tests and the demo; the
/// thresholds map overlap onto the four-rating scale.
#[derive(Debug, Clone)]
pub struct LexicalGrader {
    easy_threshold: f64,
    good_threshold: f64,
    hard_threshold: f64,
}

impl Default for LexicalGrader {
    fn default() -> Self {
        Self {
            easy_threshold: 0.8,
            good_threshold: 0.5,
            hard_threshold: 0.25,
        }
    }
}

impl LexicalGrader {
    /// Fraction of reference tokens present in the answer, in [0, 1].
    fn overlap(reference: &str, answer: &str) -> f64 {
        let reference_tokens: Vec<String> = tokenize(reference);
        if reference_tokens.is_empty() {
            return 0.0;
        }
        let answer_tokens: Vec<String> = tokenize(answer);
        let hits = reference_tokens
            .iter()
            .filter(|token| answer_tokens.contains(token))
            .count();
        hits as f64 / reference_tokens.len() as f64
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[async_trait]
impl Grader for LexicalGrader {
    async fn evaluate(
        &self,
        _question: &str,
        reference_answer: &str,
        user_answer: &str,
    ) -> Result<GradedAnswer, GraderError> {
        if user_answer.trim().is_empty() {
            return Err(GraderError::EmptyAnswer);
        }

        let overlap = Self::overlap(reference_answer, user_answer);
        let (rating, feedback) = if overlap >= self.easy_threshold {
            (4, "Spot on - you covered the key points.".to_string())
        } else if overlap >= self.good_threshold {
            (3, "Good recall, with a few details missing.".to_string())
        } else if overlap >= self.hard_threshold {
            (
                2,
                format!("Partially there. The full answer: {reference_answer}"),
            )
        } else {
            (
                1,
                format!("Not quite. The expected answer was: {reference_answer}"),
            )
        };

        Ok(GradedAnswer { rating, feedback })
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn exact_answer_rates_easy() {
        let grader = LexicalGrader::default();
        let graded = grader
            .evaluate("Capital of France?", "Paris", "paris")
            .await
            .expect("grade");
        assert_eq!(graded.rating, 4);
    }

    #[tokio::test]
    async fn partial_answer_rates_lower() {
        let grader = LexicalGrader::default();
        let graded = grader
            .evaluate(
                "What does CPU stand for?",
                "central processing unit",
                "some kind of processing thing",
            )
            .await
            .expect("grade");
        assert_eq!(graded.rating, 2);
        assert!(graded.feedback.contains("central processing unit"));
    }

    #[tokio::test]
    async fn unrelated_answer_rates_again() {
        let grader = LexicalGrader::default();
        let graded = grader
            .evaluate("Capital of France?", "Paris", "banana")
            .await
            .expect("grade");
        assert_eq!(graded.rating, 1);
        assert!(graded.feedback.contains("Paris"));
    }

    #[tokio::test]
    async fn empty_answer_is_rejected() {
        let grader = LexicalGrader::default();
        let err = grader
            .evaluate("Capital of France?", "Paris", "   ")
            .await
            .expect_err("must reject");
        assert_eq!(err, GraderError::EmptyAnswer);
    }

    #[test]
    fn overlap_is_case_and_punctuation_insensitive() {
        let overlap = LexicalGrader::overlap("Central Processing Unit", "unit... CENTRAL (processing)");
        assert!((overlap - 1.0).abs() < 1e-12);
    }
}
