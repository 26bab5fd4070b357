//! Infrastructure services

mod answer_evaluation_cache;
mod single_flight;

pub use answer_evaluation_cache::AnswerEvaluationCache;
pub use single_flight::{Flight, SingleFlight};
