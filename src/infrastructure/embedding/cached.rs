//! Embedding provider decorator with a TTL cache

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache as MokaCache;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::domain::embedding::{EmbeddingProvider, EmbeddingRequest, EmbeddingResponse};
use crate::domain::DomainError;

/// Configuration for the embedding cache
#[derive(Debug, Clone)]
pub struct EmbeddingCacheConfig {
    /// Maximum number of cached vectors
    pub max_capacity: u64,
    /// How long a vector stays cached
    pub ttl: Duration,
}

impl Default for EmbeddingCacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            ttl: Duration::from_secs(604_800),
        }
    }
}

impl EmbeddingCacheConfig {
    pub fn with_max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = capacity;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// Wraps an embedding provider and memoizes successful responses.
///
/// Keys are a SHA-256 of the model, requested dimensions and input text.
/// Failures are never cached.
pub struct CachedEmbeddingProvider {
    inner: Arc<dyn EmbeddingProvider>,
    cache: MokaCache<String, EmbeddingResponse>,
    config: EmbeddingCacheConfig,
}

impl fmt::Debug for CachedEmbeddingProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedEmbeddingProvider")
            .field("inner", &self.inner)
            .field("config", &self.config)
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

impl CachedEmbeddingProvider {
    pub fn new(inner: Arc<dyn EmbeddingProvider>, config: EmbeddingCacheConfig) -> Self {
        let cache = MokaCache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(config.ttl)
            .build();

        Self {
            inner,
            cache,
            config,
        }
    }

    fn cache_key(request: &EmbeddingRequest) -> String {
        let mut hasher = Sha256::new();
        hasher.update(request.model().as_bytes());
        hasher.update([0u8]);
        hasher.update(request.dimensions().unwrap_or(0).to_le_bytes());
        hasher.update([0u8]);
        hasher.update(request.input().as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[async_trait]
impl EmbeddingProvider for CachedEmbeddingProvider {
    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, DomainError> {
        let key = Self::cache_key(&request);

        if let Some(cached) = self.cache.get(&key).await {
            debug!(model = %request.model(), "Embedding cache hit");
            return Ok(cached);
        }

        let response = self.inner.embed(request).await?;
        self.cache.insert(key, response.clone()).await;

        Ok(response)
    }

    fn provider_name(&self) -> &'static str {
        self.inner.provider_name()
    }

    fn dimensions(&self, model: &str) -> Option<usize> {
        self.inner.dimensions(model)
    }
}
