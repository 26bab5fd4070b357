//! Infrastructure layer - Collaborator implementations and the cache service

pub mod cache;
pub mod embedding;
pub mod evaluator;
pub mod llm;
pub mod logging;
pub mod metrics;
pub mod question;
pub mod services;
