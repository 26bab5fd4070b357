//! Question validation utilities

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::DomainError;

/// Maximum length for question IDs
pub const MAX_QUESTION_ID_LENGTH: usize = 128;

static QUESTION_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.:-]+$").expect("valid question id pattern"));

/// Question validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum QuestionValidationError {
    /// Question ID is empty
    EmptyId,
    /// Question ID exceeds maximum length
    IdTooLong { length: usize, max: usize },
    /// Question ID contains invalid characters
    InvalidIdFormat { id: String },
    /// Question has no model answers to grade against
    NoModelAnswers,
    /// Question text is empty
    EmptyText,
}

impl fmt::Display for QuestionValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "Question ID cannot be empty"),
            Self::IdTooLong { length, max } => {
                write!(f, "Question ID too long: {} characters (max {})", length, max)
            }
            Self::InvalidIdFormat { id } => write!(
                f,
                "Invalid question ID format '{}': allowed characters are A-Z a-z 0-9 _ . : -",
                id
            ),
            Self::NoModelAnswers => write!(f, "Question must have at least one model answer"),
            Self::EmptyText => write!(f, "Question text cannot be empty"),
        }
    }
}

impl std::error::Error for QuestionValidationError {}

impl From<QuestionValidationError> for DomainError {
    fn from(err: QuestionValidationError) -> Self {
        DomainError::validation(err.to_string())
    }
}

/// Validate a question ID
pub fn validate_question_id(id: &str) -> Result<(), QuestionValidationError> {
    if id.is_empty() {
        return Err(QuestionValidationError::EmptyId);
    }

    if id.len() > MAX_QUESTION_ID_LENGTH {
        return Err(QuestionValidationError::IdTooLong {
            length: id.len(),
            max: MAX_QUESTION_ID_LENGTH,
        });
    }

    if !QUESTION_ID_PATTERN.is_match(id) {
        return Err(QuestionValidationError::InvalidIdFormat { id: id.to_string() });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_question_ids() {
        assert!(validate_question_id("q1").is_ok());
        assert!(validate_question_id("rust-ownership_01").is_ok());
        assert!(validate_question_id("quiz:42.3").is_ok());
    }

    #[test]
    fn test_empty_question_id() {
        assert_eq!(
            validate_question_id(""),
            Err(QuestionValidationError::EmptyId)
        );
    }

    #[test]
    fn test_question_id_too_long() {
        let id = "q".repeat(MAX_QUESTION_ID_LENGTH + 1);
        assert!(matches!(
            validate_question_id(&id),
            Err(QuestionValidationError::IdTooLong { .. })
        ));
    }

    #[test]
    fn test_question_id_invalid_characters() {
        assert!(matches!(
            validate_question_id("q 1"),
            Err(QuestionValidationError::InvalidIdFormat { .. })
        ));
        assert!(matches!(
            validate_question_id("q/1"),
            Err(QuestionValidationError::InvalidIdFormat { .. })
        ));
    }

    #[test]
    fn test_validation_error_converts_to_domain_error() {
        let err: DomainError = QuestionValidationError::EmptyId.into();
        assert!(matches!(err, DomainError::Validation { .. }));
    }
}
