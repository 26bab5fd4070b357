//! LLM-backed answer evaluator
//!
//! Asks a chat model to grade an answer against the question's model answers
//! and keywords, and parses the JSON grade it returns.

use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::error::UpstreamService;
use crate::domain::evaluation::{Evaluation, Evaluator};
use crate::domain::llm::{LlmProvider, LlmRequest, LlmResponseFormat};
use crate::domain::question::Question;
use crate::domain::DomainError;
use crate::infrastructure::llm::RetryConfig;

const SYSTEM_PROMPT: &str = "You are a strict but fair examiner. You grade free-text quiz \
answers against reference answers and reply with a single JSON object only.";

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{(\w+)\}").expect("valid placeholder pattern"));

const DEFAULT_PROMPT_TEMPLATE: &str = r#"Question:
${question}

Reference answers:
${model_answers}

Expected keywords: ${keywords}

Candidate answer (between the markers):
<<<
${answer}
>>>

Grade the candidate answer. Reply with JSON of the form:
{"score": <0..1>, "explanation": "<one or two sentences>", "completeness": <0..1>, "relevance": <0..1>, "accuracy": <0..1>, "keyword_matches": ["<expected keywords present in the answer>"]}"#;

/// Configuration for the LLM evaluator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmEvaluatorConfig {
    /// Chat model used for grading
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Upper bound on the grade's length
    pub max_tokens: u32,
    /// User prompt with `${question}`, `${model_answers}`, `${keywords}`
    /// and `${answer}` placeholders
    pub prompt_template: String,
    /// Retry policy for transient failures
    pub retry: RetryConfig,
}

impl Default for LlmEvaluatorConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.0,
            max_tokens: 400,
            prompt_template: DEFAULT_PROMPT_TEMPLATE.to_string(),
            retry: RetryConfig::default(),
        }
    }
}

impl LlmEvaluatorConfig {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_prompt_template(mut self, template: impl Into<String>) -> Self {
        self.prompt_template = template.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

/// Evaluator that grades answers with a chat model
#[derive(Debug)]
pub struct LlmAnswerEvaluator {
    provider: Arc<dyn LlmProvider>,
    config: LlmEvaluatorConfig,
}

impl LlmAnswerEvaluator {
    pub fn new(provider: Arc<dyn LlmProvider>, config: LlmEvaluatorConfig) -> Self {
        Self { provider, config }
    }

    fn build_prompt(&self, question: &Question, answer_text: &str) -> String {
        let model_answers = question
            .model_answers()
            .iter()
            .enumerate()
            .map(|(i, answer)| format!("{}. {}", i + 1, answer))
            .collect::<Vec<_>>()
            .join("\n");

        let keywords = if question.keywords().is_empty() {
            "(none)".to_string()
        } else {
            question.keywords().join(", ")
        };

        // Single pass: substituted text is never scanned for placeholders
        PLACEHOLDER
            .replace_all(&self.config.prompt_template, |caps: &Captures| {
                match &caps[1] {
                    "question" => question.text().to_string(),
                    "model_answers" => model_answers.clone(),
                    "keywords" => keywords.clone(),
                    "answer" => answer_text.to_string(),
                    _ => caps[0].to_string(),
                }
            })
            .into_owned()
    }

    fn parse_grade(&self, content: &str) -> Result<Evaluation, DomainError> {
        let json_str = extract_json(content).unwrap_or(content);

        let grade: LlmGrade = serde_json::from_str(json_str).map_err(|e| {
            warn!("Failed to parse evaluator response: {} - Response: {}", e, content);
            DomainError::malformed_response(
                UpstreamService::Evaluator,
                format!("Invalid grade format: {}", e),
            )
        })?;

        Ok(Evaluation::new(grade.score, grade.explanation)
            .with_completeness(grade.completeness)
            .with_relevance(grade.relevance)
            .with_accuracy(grade.accuracy)
            .with_keyword_matches(grade.keyword_matches))
    }

    async fn evaluate_once(
        &self,
        question: &Question,
        answer_text: &str,
    ) -> Result<Evaluation, DomainError> {
        let request = LlmRequest::builder()
            .system(SYSTEM_PROMPT)
            .user(self.build_prompt(question, answer_text))
            .temperature(self.config.temperature)
            .max_tokens(self.config.max_tokens)
            .response_format(LlmResponseFormat::JsonObject)
            .build();

        let response = self
            .provider
            .chat(&self.config.model, request)
            .await
            .map_err(|e| e.attributed_to(UpstreamService::Evaluator))?;

        let content = response.content();

        if content.trim().is_empty() {
            return Err(DomainError::malformed_response(
                UpstreamService::Evaluator,
                "Empty response from evaluator model",
            ));
        }

        self.parse_grade(content)
    }
}

/// Grade as returned by the model
#[derive(Debug, Deserialize)]
struct LlmGrade {
    score: f64,
    explanation: String,
    completeness: f64,
    relevance: f64,
    accuracy: f64,
    #[serde(default)]
    keyword_matches: Vec<String>,
}

/// Extract JSON object from a string (handles markdown code blocks)
fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;

    if start < end {
        Some(&text[start..=end])
    } else {
        None
    }
}

#[async_trait]
impl Evaluator for LlmAnswerEvaluator {
    async fn evaluate(
        &self,
        question: &Question,
        answer_text: &str,
    ) -> Result<Evaluation, DomainError> {
        debug!(
            question_id = %question.id(),
            model = %self.config.model,
            "Grading answer with LLM"
        );

        self.config
            .retry
            .run("evaluate", || self.evaluate_once(question, answer_text))
            .await
    }

    fn evaluator_name(&self) -> &'static str {
        "llm"
    }
}
