//! Question domain - the questions answers are graded against

mod entity;
mod repository;
mod validation;

pub use entity::{Question, QuestionId};
pub use repository::QuestionRepository;
pub use validation::{validate_question_id, QuestionValidationError, MAX_QUESTION_ID_LENGTH};

#[cfg(test)]
pub use repository::MockQuestionRepository;
