//! Answer cache configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Configuration for the answer evaluation cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerCacheConfig {
    /// Minimum similarity (inclusive) for a cached answer to be reused
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,

    /// Time-to-live for cached evaluations in seconds
    #[serde(default = "default_evaluation_ttl_secs")]
    pub evaluation_ttl_secs: u64,

    /// Time-to-live for memoized embeddings in seconds
    #[serde(default = "default_embedding_ttl_secs")]
    pub embedding_ttl_secs: u64,

    /// Embedding model to request vectors from
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Prefix of every store key
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Coalesce concurrent misses for the same answer
    #[serde(default = "default_true")]
    pub single_flight: bool,

    /// Upper bound for one embedding call
    #[serde(default = "default_embedding_timeout_ms")]
    pub embedding_timeout_ms: u64,

    /// Upper bound for one evaluator call
    #[serde(default = "default_evaluator_timeout_ms")]
    pub evaluator_timeout_ms: u64,
}

fn default_similarity_threshold() -> f64 {
    0.9
}

fn default_evaluation_ttl_secs() -> u64 {
    86400
}

fn default_embedding_ttl_secs() -> u64 {
    604800
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_key_prefix() -> String {
    "answer_eval".to_string()
}

fn default_true() -> bool {
    true
}

fn default_embedding_timeout_ms() -> u64 {
    5000
}

fn default_evaluator_timeout_ms() -> u64 {
    60000
}

impl Default for AnswerCacheConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            evaluation_ttl_secs: default_evaluation_ttl_secs(),
            embedding_ttl_secs: default_embedding_ttl_secs(),
            embedding_model: default_embedding_model(),
            key_prefix: default_key_prefix(),
            single_flight: default_true(),
            embedding_timeout_ms: default_embedding_timeout_ms(),
            evaluator_timeout_ms: default_evaluator_timeout_ms(),
        }
    }
}

impl AnswerCacheConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Get evaluation TTL as Duration
    pub fn evaluation_ttl(&self) -> Duration {
        Duration::from_secs(self.evaluation_ttl_secs)
    }

    pub fn embedding_ttl(&self) -> Duration {
        Duration::from_secs(self.embedding_ttl_secs)
    }

    pub fn embedding_timeout(&self) -> Duration {
        Duration::from_millis(self.embedding_timeout_ms)
    }

    pub fn evaluator_timeout(&self) -> Duration {
        Duration::from_millis(self.evaluator_timeout_ms)
    }

    /// Set the similarity threshold
    pub fn with_similarity_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    /// Set the evaluation TTL
    pub fn with_evaluation_ttl(mut self, ttl: Duration) -> Self {
        self.evaluation_ttl_secs = ttl.as_secs();
        self
    }

    /// Set the embedding model
    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = model.into();
        self
    }

    /// Set the key prefix
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Enable or disable single-flight coalescing
    pub fn with_single_flight(mut self, enabled: bool) -> Self {
        self.single_flight = enabled;
        self
    }

    pub fn with_embedding_timeout(mut self, timeout: Duration) -> Self {
        self.embedding_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_evaluator_timeout(mut self, timeout: Duration) -> Self {
        self.evaluator_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> Result<(), DomainError> {
        if !self.similarity_threshold.is_finite()
            || !(0.0..=1.0).contains(&self.similarity_threshold)
        {
            return Err(DomainError::configuration(format!(
                "similarity_threshold must be within [0, 1], got {}",
                self.similarity_threshold
            )));
        }

        if self.evaluation_ttl_secs == 0 {
            return Err(DomainError::configuration(
                "evaluation_ttl_secs must be greater than zero",
            ));
        }

        if self.embedding_ttl_secs == 0 {
            return Err(DomainError::configuration(
                "embedding_ttl_secs must be greater than zero",
            ));
        }

        if self.key_prefix.trim().is_empty() {
            return Err(DomainError::configuration("key_prefix cannot be empty"));
        }

        if self.embedding_model.trim().is_empty() {
            return Err(DomainError::configuration("embedding_model cannot be empty"));
        }

        Ok(())
    }
}
