//! Evaluation domain - graded answers and the evaluator contract

mod entity;
mod evaluator;

pub use entity::Evaluation;
pub use evaluator::Evaluator;

#[cfg(test)]
pub use evaluator::mock::MockEvaluator;
