//! Cache store factory for runtime selection

use std::sync::Arc;

use crate::domain::cache::CacheStore;
use crate::domain::DomainError;

use super::in_memory::InMemoryCacheStore;
use super::redis::{RedisCacheStore, RedisCacheStoreConfig};

/// Supported cache store backends
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum CacheStoreType {
    /// Process-local store
    #[default]
    InMemory,
    /// Redis hashes
    Redis,
}

impl std::fmt::Display for CacheStoreType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheStoreType::InMemory => write!(f, "in_memory"),
            CacheStoreType::Redis => write!(f, "redis"),
        }
    }
}

impl std::str::FromStr for CacheStoreType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "in_memory" | "inmemory" | "memory" => Ok(CacheStoreType::InMemory),
            "redis" => Ok(CacheStoreType::Redis),
            _ => Err(DomainError::configuration(format!(
                "Unknown cache store backend: {}. Valid backends: in_memory, redis",
                s
            ))),
        }
    }
}

/// Configuration for the cache store factory
#[derive(Debug, Clone, Default)]
pub struct CacheStoreConfig {
    /// Backend to create
    pub store_type: CacheStoreType,
    /// Redis URL (required for the Redis backend)
    pub redis_url: Option<String>,
    /// Disable HPEXPIRE for Redis servers older than 7.4
    pub redis_per_field_expiry: bool,
}

impl CacheStoreConfig {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn redis(url: impl Into<String>) -> Self {
        Self {
            store_type: CacheStoreType::Redis,
            redis_url: Some(url.into()),
            redis_per_field_expiry: true,
        }
    }

    pub fn with_per_field_expiry(mut self, enabled: bool) -> Self {
        self.redis_per_field_expiry = enabled;
        self
    }
}

/// Factory for creating cache store instances
#[derive(Debug, Default)]
pub struct CacheStoreFactory;

impl CacheStoreFactory {
    pub fn new() -> Self {
        Self
    }

    /// Creates a cache store based on configuration
    pub async fn create(
        &self,
        config: &CacheStoreConfig,
    ) -> Result<Arc<dyn CacheStore>, DomainError> {
        match config.store_type {
            CacheStoreType::InMemory => Ok(Arc::new(InMemoryCacheStore::new())),
            CacheStoreType::Redis => {
                let url = config.redis_url.clone().ok_or_else(|| {
                    DomainError::configuration("Redis URL is required for the redis backend")
                })?;

                let redis_config = RedisCacheStoreConfig::new(url)
                    .with_per_field_expiry(config.redis_per_field_expiry);

                let store = RedisCacheStore::new(redis_config).await?;
                Ok(Arc::new(store))
            }
        }
    }
}
