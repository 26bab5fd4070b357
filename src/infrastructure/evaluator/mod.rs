//! Evaluator implementations

mod llm_evaluator;

pub use llm_evaluator::{LlmAnswerEvaluator, LlmEvaluatorConfig};
