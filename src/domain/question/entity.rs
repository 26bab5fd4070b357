//! Question entity and related types

use serde::{Deserialize, Serialize};

use super::validation::{validate_question_id, QuestionValidationError};

/// Question identifier - opaque, groups cached answers
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct QuestionId(String);

impl QuestionId {
    /// Create a new QuestionId after validation
    pub fn new(id: impl Into<String>) -> Result<Self, QuestionValidationError> {
        let id = id.into();
        validate_question_id(&id)?;
        Ok(Self(id))
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for QuestionId {
    type Error = QuestionValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<QuestionId> for String {
    fn from(id: QuestionId) -> Self {
        id.0
    }
}

impl std::fmt::Display for QuestionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A quiz question with the reference material answers are graded against
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    text: String,
    model_answers: Vec<String>,
    #[serde(default)]
    keywords: Vec<String>,
}

impl Question {
    pub fn new(
        id: QuestionId,
        text: impl Into<String>,
        model_answers: Vec<String>,
    ) -> Result<Self, QuestionValidationError> {
        let text = text.into();

        if text.trim().is_empty() {
            return Err(QuestionValidationError::EmptyText);
        }

        if model_answers.iter().all(|a| a.trim().is_empty()) {
            return Err(QuestionValidationError::NoModelAnswers);
        }

        Ok(Self {
            id,
            text,
            model_answers,
            keywords: Vec::new(),
        })
    }

    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = keywords;
        self
    }

    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn model_answers(&self) -> &[String] {
        &self.model_answers
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}
