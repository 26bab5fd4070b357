use std::path::Path;

use serde::Deserialize;

use crate::domain::answer_cache::AnswerCacheConfig;
use crate::domain::DomainError;
use crate::infrastructure::cache::{CacheStoreConfig, CacheStoreType};
use crate::infrastructure::evaluator::LlmEvaluatorConfig;
use crate::infrastructure::llm::RetryConfig;

/// Environment variable consulted when a section has no `api_key`
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub cache: AnswerCacheConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub evaluator: EvaluatorConfig,
    /// JSON file seeding the question repository
    #[serde(default)]
    pub questions_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Cache store backend selection
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// `in_memory` or `redis`
    #[serde(default = "default_store_backend")]
    pub backend: String,
    #[serde(default)]
    pub redis_url: Option<String>,
    /// Per-field expiry needs Redis 7.4 or newer
    #[serde(default = "default_true")]
    pub per_field_expiry: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EvaluatorConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_evaluator_model")]
    pub model: String,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_initial_retry_delay_ms")]
    pub initial_retry_delay_ms: u64,
    /// Replaces the built-in grading prompt
    #[serde(default)]
    pub prompt_template: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_store_backend() -> String {
    "in_memory".to_string()
}

fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    DEFAULT_OPENAI_BASE_URL.to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_cache_capacity() -> u64 {
    10_000
}

fn default_evaluator_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_retries() -> u32 {
    2
}

fn default_initial_retry_delay_ms() -> u64 {
    250
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            redis_url: None,
            per_field_expiry: default_true(),
        }
    }
}

impl StoreConfig {
    /// Resolve the backend name into a factory configuration
    pub fn to_cache_store_config(&self) -> Result<CacheStoreConfig, DomainError> {
        let store_type: CacheStoreType = self.backend.parse()?;

        Ok(CacheStoreConfig {
            store_type,
            redis_url: self.redis_url.clone(),
            redis_per_field_expiry: self.per_field_expiry,
        })
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            model: default_embedding_model(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

impl EmbeddingConfig {
    pub fn resolve_api_key(&self) -> Result<String, DomainError> {
        resolve_api_key(self.api_key.as_deref(), "embedding")
    }
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            model: default_evaluator_model(),
            temperature: 0.0,
            max_retries: default_max_retries(),
            initial_retry_delay_ms: default_initial_retry_delay_ms(),
            prompt_template: None,
        }
    }
}

impl EvaluatorConfig {
    pub fn resolve_api_key(&self) -> Result<String, DomainError> {
        resolve_api_key(self.api_key.as_deref(), "evaluator")
    }

    /// Grading settings for the LLM evaluator
    pub fn to_llm_evaluator_config(&self) -> LlmEvaluatorConfig {
        let config = LlmEvaluatorConfig::default()
            .with_model(self.model.clone())
            .with_temperature(self.temperature)
            .with_retry(
                RetryConfig::new(self.max_retries).with_initial_delay(self.initial_retry_delay_ms),
            );

        match self.prompt_template {
            Some(ref template) => config.with_prompt_template(template.clone()),
            None => config,
        }
    }
}

fn resolve_api_key(configured: Option<&str>, section: &str) -> Result<String, DomainError> {
    match configured.filter(|key| !key.trim().is_empty()) {
        Some(key) => Ok(key.to_string()),
        None => std::env::var(OPENAI_API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                DomainError::configuration(format!(
                    "{}.api_key is not set and {} is missing",
                    section, OPENAI_API_KEY_ENV
                ))
            }),
    }
}

impl AppConfig {
    /// Load `default` and `local` files from `config_dir`, then `APP__*`
    /// environment overrides
    pub fn load(config_dir: impl AsRef<Path>) -> Result<Self, config::ConfigError> {
        let dir = config_dir.as_ref();

        let config = config::Config::builder()
            .add_source(
                config::File::with_name(&dir.join("default").to_string_lossy()).required(false),
            )
            .add_source(
                config::File::with_name(&dir.join("local").to_string_lossy()).required(false),
            )
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Answer cache settings with the embedding model taken from the
    /// `embedding` section
    pub fn answer_cache_config(&self) -> Result<AnswerCacheConfig, DomainError> {
        let config = self
            .cache
            .clone()
            .with_embedding_model(self.embedding.model.clone());
        config.validate()?;
        Ok(config)
    }
}
