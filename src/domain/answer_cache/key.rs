//! Answer normalization and store key derivation

use crate::domain::question::QuestionId;

/// Normalize an answer before it is used as a field key.
///
/// Only surrounding whitespace is removed; case and punctuation are kept.
pub fn normalize_answer(answer_text: &str) -> &str {
    answer_text.trim()
}

/// Key of the field set holding every cached answer for a question
pub fn question_set_key(prefix: &str, question_id: &QuestionId) -> String {
    format!("{}:question:{}", prefix, question_id)
}
