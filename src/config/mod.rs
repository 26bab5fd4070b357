//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, EmbeddingConfig, EvaluatorConfig, LogFormat, LoggingConfig, StoreConfig,
    OPENAI_API_KEY_ENV,
};
