//! Evaluation result of grading one answer

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Structured grade of a free-text answer.
///
/// All numeric fields are fractions in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Overall score
    pub score: f64,
    /// Human-readable justification of the score
    pub explanation: String,
    /// How much of the expected content the answer covers
    pub completeness: f64,
    /// How on-topic the answer is
    pub relevance: f64,
    /// How factually correct the answer is
    pub accuracy: f64,
    /// Question keywords found in the answer
    #[serde(default)]
    pub keyword_matches: Vec<String>,
}

impl Evaluation {
    pub fn new(score: f64, explanation: impl Into<String>) -> Self {
        Self {
            score,
            explanation: explanation.into(),
            completeness: score,
            relevance: score,
            accuracy: score,
            keyword_matches: Vec::new(),
        }
    }

    pub fn with_completeness(mut self, completeness: f64) -> Self {
        self.completeness = completeness;
        self
    }

    pub fn with_relevance(mut self, relevance: f64) -> Self {
        self.relevance = relevance;
        self
    }

    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = accuracy;
        self
    }

    pub fn with_keyword_matches(mut self, keywords: Vec<String>) -> Self {
        self.keyword_matches = keywords;
        self
    }

    /// Reject scores outside `[0, 1]` (or non-finite).
    ///
    /// An evaluation failing this check must never reach the cache.
    pub fn validate(&self) -> Result<(), DomainError> {
        let fields = [
            ("score", self.score),
            ("completeness", self.completeness),
            ("relevance", self.relevance),
            ("accuracy", self.accuracy),
        ];

        for (name, value) in fields {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(DomainError::invariant(format!(
                    "Evaluator returned {} = {} outside [0, 1]",
                    name, value
                )));
            }
        }

        Ok(())
    }
}
