//! In-memory question repository

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use crate::domain::question::{Question, QuestionId, QuestionRepository};
use crate::domain::DomainError;

/// Question as written in a seed file
#[derive(Debug, Deserialize)]
struct QuestionRecord {
    id: QuestionId,
    text: String,
    model_answers: Vec<String>,
    #[serde(default)]
    keywords: Vec<String>,
}

/// Read-only question repository held in memory.
///
/// Seeded at startup, either programmatically or from a JSON array file.
#[derive(Debug, Default)]
pub struct InMemoryQuestionRepository {
    questions: HashMap<QuestionId, Question>,
}

impl InMemoryQuestionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_question(mut self, question: Question) -> Self {
        self.questions.insert(question.id().clone(), question);
        self
    }

    pub fn with_questions(mut self, questions: Vec<Question>) -> Self {
        for question in questions {
            self.questions.insert(question.id().clone(), question);
        }
        self
    }

    /// Parses a JSON array of questions, validating each one
    pub fn from_json_str(json: &str) -> Result<Self, DomainError> {
        let records: Vec<QuestionRecord> = serde_json::from_str(json)
            .map_err(|e| DomainError::configuration(format!("Invalid questions file: {}", e)))?;

        let mut questions = Vec::with_capacity(records.len());

        for record in records {
            let id = record.id.clone();
            let question = Question::new(record.id, record.text, record.model_answers)
                .map_err(|e| {
                    DomainError::configuration(format!("Invalid question '{}': {}", id, e))
                })?
                .with_keywords(record.keywords);
            questions.push(question);
        }

        Ok(Self::new().with_questions(questions))
    }

    /// Loads questions from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, DomainError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            DomainError::configuration(format!(
                "Failed to read questions file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let repository = Self::from_json_str(&json)?;
        info!(
            path = %path.display(),
            count = repository.questions.len(),
            "Loaded questions"
        );

        Ok(repository)
    }
}

#[async_trait]
impl QuestionRepository for InMemoryQuestionRepository {
    async fn get(&self, id: &QuestionId) -> Result<Option<Question>, DomainError> {
        Ok(self.questions.get(id).cloned())
    }

    async fn count(&self) -> Result<usize, DomainError> {
        Ok(self.questions.len())
    }
}
