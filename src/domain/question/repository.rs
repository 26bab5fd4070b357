//! Question repository trait

use async_trait::async_trait;

use super::{Question, QuestionId};
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Read access to question records.
///
/// Persistence of questions lives outside this crate; implementations only
/// need to look questions up for grading.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Get a question by ID
    async fn get(&self, id: &QuestionId) -> Result<Option<Question>, DomainError>;

    /// Number of known questions
    async fn count(&self) -> Result<usize, DomainError>;
}
