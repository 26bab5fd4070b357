//! Cache store trait definition

use std::collections::HashMap;
use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::DomainError;

/// Hash-map-per-key store with per-field expiry.
///
/// A `set_key` groups many fields; every field carries its own TTL. Values
/// are opaque bytes, typically JSON. Failures are reported as
/// `DomainError::CacheUnavailable`.
#[async_trait]
pub trait CacheStore: Send + Sync + Debug {
    /// Gets one live field of a set
    async fn get_field(&self, set_key: &str, field_key: &str)
    -> Result<Option<Vec<u8>>, DomainError>;

    /// Gets every live field of a set
    async fn get_all_fields(&self, set_key: &str) -> Result<HashMap<String, Vec<u8>>, DomainError>;

    /// Upserts a field, (re)starting its TTL
    async fn set_field(
        &self,
        set_key: &str,
        field_key: &str,
        value: &[u8],
        ttl: Duration,
    ) -> Result<(), DomainError>;

    /// Get the backend name
    fn backend_name(&self) -> &'static str;
}

/// Extension trait providing typed JSON writes
pub trait CacheStoreExt: CacheStore {
    /// Encodes a value as JSON and stores it in a field
    fn set_json_field<'a, V>(
        &'a self,
        set_key: &'a str,
        field_key: &'a str,
        value: &'a V,
        ttl: Duration,
    ) -> impl std::future::Future<Output = Result<(), DomainError>> + Send
    where
        V: Serialize + Send + Sync,
    {
        async move {
            let data = serde_json::to_vec(value).map_err(|e| {
                DomainError::cache(format!("Failed to serialize field value: {}", e))
            })?;
            self.set_field(set_key, field_key, &data, ttl).await
        }
    }
}

// Blanket implementation for all types implementing CacheStore
impl<T: CacheStore + ?Sized> CacheStoreExt for T {}
