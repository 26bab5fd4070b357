//! Answer Evaluation Cache
//!
//! Caches LLM grades of free-text quiz answers so that repeated or
//! near-duplicate answers to the same question reuse an earlier evaluation:
//! - Exact-match lookup on the trimmed answer text
//! - Embedding similarity scan with a configurable threshold
//! - Evaluator fallback with TTL-bounded storage (in-memory or Redis)

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use domain::question::QuestionRepository;
use infrastructure::{
    cache::CacheStoreFactory,
    embedding::{CachedEmbeddingProvider, EmbeddingCacheConfig, OpenAiEmbeddingProvider},
    evaluator::LlmAnswerEvaluator,
    llm::{HttpClient, OpenAiProvider},
    question::InMemoryQuestionRepository,
    services::AnswerEvaluationCache,
};
use tracing::{info, warn};

/// Build the answer cache with the collaborators selected by configuration
pub async fn create_answer_cache(config: &AppConfig) -> anyhow::Result<AnswerEvaluationCache> {
    let cache_config = config.answer_cache_config()?;

    let store_config = config.store.to_cache_store_config()?;
    let store = CacheStoreFactory::new().create(&store_config).await?;
    info!(backend = store.backend_name(), "Cache store ready");

    let embedding_provider = OpenAiEmbeddingProvider::with_base_url(
        HttpClient::new(),
        config.embedding.resolve_api_key()?,
        config.embedding.base_url.clone(),
    );
    let embedding_provider = Arc::new(CachedEmbeddingProvider::new(
        Arc::new(embedding_provider),
        EmbeddingCacheConfig::default()
            .with_max_capacity(config.embedding.cache_capacity)
            .with_ttl(cache_config.embedding_ttl()),
    ));

    let llm_provider = OpenAiProvider::with_base_url(
        HttpClient::new(),
        config.evaluator.resolve_api_key()?,
        config.evaluator.base_url.clone(),
    );
    let evaluator = Arc::new(LlmAnswerEvaluator::new(
        Arc::new(llm_provider),
        config.evaluator.to_llm_evaluator_config(),
    ));

    let questions = create_question_repository(config)?;
    info!(count = questions.count().await?, "Question repository ready");

    let cache = AnswerEvaluationCache::new(store, embedding_provider, evaluator, questions)
        .with_config(cache_config)?;

    Ok(cache)
}

fn create_question_repository(
    config: &AppConfig,
) -> anyhow::Result<Arc<dyn QuestionRepository>> {
    match config.questions_path {
        Some(ref path) => Ok(Arc::new(InMemoryQuestionRepository::from_json_file(path)?)),
        None => {
            warn!("No questions_path configured, every evaluation will fail with NotFound");
            Ok(Arc::new(InMemoryQuestionRepository::new()))
        }
    }
}
