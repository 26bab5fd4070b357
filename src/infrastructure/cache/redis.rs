//! Redis cache store

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

use crate::domain::cache::CacheStore;
use crate::domain::DomainError;

/// Configuration for the Redis cache store
#[derive(Debug, Clone)]
pub struct RedisCacheStoreConfig {
    /// Redis connection URL (e.g., "redis://127.0.0.1:6379")
    pub url: String,
    /// Expire individual hash fields with HPEXPIRE (Redis 7.4+).
    ///
    /// When disabled only the whole hash carries a TTL, and stale fields are
    /// filtered by the record's own `expires_at`.
    pub per_field_expiry: bool,
}

impl Default for RedisCacheStoreConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            per_field_expiry: true,
        }
    }
}

impl RedisCacheStoreConfig {
    /// Creates a new configuration with the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_per_field_expiry(mut self, enabled: bool) -> Self {
        self.per_field_expiry = enabled;
        self
    }
}

/// Cache store backed by one Redis hash per set key
#[derive(Clone)]
pub struct RedisCacheStore {
    connection: ConnectionManager,
    config: RedisCacheStoreConfig,
}

impl fmt::Debug for RedisCacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCacheStore")
            .field("config", &self.config)
            .field("connection", &"<ConnectionManager>")
            .finish()
    }
}

impl RedisCacheStore {
    /// Connects to Redis
    pub async fn new(config: RedisCacheStoreConfig) -> Result<Self, DomainError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| DomainError::cache(format!("Failed to create Redis client: {}", e)))?;

        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| DomainError::cache(format!("Failed to connect to Redis: {}", e)))?;

        Ok(Self { connection, config })
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get_field(
        &self,
        set_key: &str,
        field_key: &str,
    ) -> Result<Option<Vec<u8>>, DomainError> {
        let mut conn = self.connection.clone();

        let result: Option<Vec<u8>> = conn.hget(set_key, field_key).await.map_err(|e| {
            DomainError::cache(format!("Failed to get field of '{}': {}", set_key, e))
        })?;

        Ok(result)
    }

    async fn get_all_fields(&self, set_key: &str) -> Result<HashMap<String, Vec<u8>>, DomainError> {
        let mut conn = self.connection.clone();

        let result: HashMap<String, Vec<u8>> = conn.hgetall(set_key).await.map_err(|e| {
            DomainError::cache(format!("Failed to get fields of '{}': {}", set_key, e))
        })?;

        Ok(result)
    }

    async fn set_field(
        &self,
        set_key: &str,
        field_key: &str,
        value: &[u8],
        ttl: Duration,
    ) -> Result<(), DomainError> {
        let mut conn = self.connection.clone();
        let ttl_ms = ttl.as_millis().clamp(1, i64::MAX as u128) as i64;

        let mut pipe = redis::pipe();
        pipe.atomic().hset(set_key, field_key, value).ignore();

        if self.config.per_field_expiry {
            pipe.cmd("HPEXPIRE")
                .arg(set_key)
                .arg(ttl_ms)
                .arg("FIELDS")
                .arg(1)
                .arg(field_key)
                .ignore();
        }

        // Hash TTL tracks the most recently written field
        pipe.pexpire(set_key, ttl_ms).ignore();

        let _: () = pipe.query_async(&mut conn).await.map_err(|e| {
            DomainError::cache(format!("Failed to set field of '{}': {}", set_key, e))
        })?;

        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // These tests require a running Redis 7.4+ instance
    // Run with: cargo test -- --ignored

    async fn test_store() -> RedisCacheStore {
        RedisCacheStore::new(RedisCacheStoreConfig::new("redis://127.0.0.1:6379"))
            .await
            .unwrap()
    }

    #[test]
    fn test_config_defaults() {
        let config = RedisCacheStoreConfig::new("redis://cache:6379");

        assert_eq!(config.url, "redis://cache:6379");
        assert!(config.per_field_expiry);
        assert!(!config.with_per_field_expiry(false).per_field_expiry);
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_set_and_get_field() {
        let store = test_store().await;

        store
            .set_field("test:question:q1", "answer", b"{}", Duration::from_secs(60))
            .await
            .unwrap();

        let value = store.get_field("test:question:q1", "answer").await.unwrap();
        assert_eq!(value, Some(b"{}".to_vec()));
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_get_all_fields() {
        let store = test_store().await;
        let ttl = Duration::from_secs(60);

        store.set_field("test:question:q2", "a", b"1", ttl).await.unwrap();
        store.set_field("test:question:q2", "b", b"2", ttl).await.unwrap();

        let fields = store.get_all_fields("test:question:q2").await.unwrap();
        assert_eq!(fields.get("a"), Some(&b"1".to_vec()));
        assert_eq!(fields.get("b"), Some(&b"2".to_vec()));
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_field_expires() {
        let store = test_store().await;

        store
            .set_field("test:question:q3", "a", b"1", Duration::from_millis(50))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(store.get_field("test:question:q3", "a").await.unwrap().is_none());
    }
}
