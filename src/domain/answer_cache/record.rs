//! Cached answer record

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::evaluation::Evaluation;
use crate::domain::question::QuestionId;
use crate::domain::DomainError;

/// One previously evaluated answer for one question.
///
/// Stored as JSON so the store stays human-inspectable. `embedding` is `None`
/// for records written while the embedding provider was failing; those only
/// serve exact-text lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedAnswerRecord {
    question_id: QuestionId,
    answer_text: String,
    embedding: Option<Vec<f32>>,
    evaluation: Evaluation,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl CachedAnswerRecord {
    pub fn new(
        question_id: QuestionId,
        answer_text: impl Into<String>,
        embedding: Option<Vec<f32>>,
        evaluation: Evaluation,
        ttl: Duration,
    ) -> Self {
        Self::new_at(question_id, answer_text, embedding, evaluation, ttl, Utc::now())
    }

    /// Create a record as if it had been written at `created_at`
    pub fn new_at(
        question_id: QuestionId,
        answer_text: impl Into<String>,
        embedding: Option<Vec<f32>>,
        evaluation: Evaluation,
        ttl: Duration,
        created_at: DateTime<Utc>,
    ) -> Self {
        let expires_at = TimeDelta::from_std(ttl)
            .ok()
            .and_then(|ttl| created_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Self {
            question_id,
            answer_text: answer_text.into(),
            embedding,
            evaluation,
            created_at,
            expires_at,
        }
    }

    pub fn question_id(&self) -> &QuestionId {
        &self.question_id
    }

    pub fn answer_text(&self) -> &str {
        &self.answer_text
    }

    pub fn embedding(&self) -> Option<&[f32]> {
        self.embedding.as_deref()
    }

    pub fn evaluation(&self) -> &Evaluation {
        &self.evaluation
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Dimensionality of the stored embedding, if any
    pub fn dimensions(&self) -> Option<usize> {
        self.embedding.as_ref().map(Vec::len)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Encode as the JSON stored in a cache field
    pub fn to_bytes(&self) -> Result<Vec<u8>, DomainError> {
        serde_json::to_vec(self)
            .map_err(|e| DomainError::cache(format!("Failed to serialize cached answer: {}", e)))
    }

    /// Decode a cache field value
    pub fn from_bytes(data: &[u8]) -> Result<Self, DomainError> {
        serde_json::from_slice(data)
            .map_err(|e| DomainError::cache(format!("Failed to deserialize cached answer: {}", e)))
    }
}
