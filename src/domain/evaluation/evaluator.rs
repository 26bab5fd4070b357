//! Evaluator trait definition

use std::fmt::Debug;

use async_trait::async_trait;

use super::Evaluation;
use crate::domain::question::Question;
use crate::domain::DomainError;

/// Scores a free-text answer against a question's model answers and keywords.
///
/// Failures are reported as `DomainError::Upstream` attributed to
/// `UpstreamService::Evaluator`. Retrying is the implementation's concern.
#[async_trait]
pub trait Evaluator: Send + Sync + Debug {
    /// Grade `answer_text` for `question`
    async fn evaluate(
        &self,
        question: &Question,
        answer_text: &str,
    ) -> Result<Evaluation, DomainError>;

    /// Get the evaluator name
    fn evaluator_name(&self) -> &'static str;
}
