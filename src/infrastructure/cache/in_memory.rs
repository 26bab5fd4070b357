//! In-memory cache store

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::debug;

use crate::domain::cache::CacheStore;
use crate::domain::DomainError;

/// Longest TTL honoured; larger values are capped to avoid `Instant` overflow
const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 3600);

/// Minimum gap between two full sweeps triggered by writes
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

type Sets = HashMap<String, HashMap<String, FieldEntry>>;

/// Field value with its own deadline
#[derive(Debug, Clone)]
struct FieldEntry {
    data: Vec<u8>,
    expires_at: Instant,
}

impl FieldEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Process-local cache store.
///
/// Expiry follows the tokio clock, so paused-time tests can advance past a
/// TTL. Expired fields are dropped when their set is read or written, and
/// writes sweep every set at most once per `SWEEP_INTERVAL`.
#[derive(Debug, Default)]
pub struct InMemoryCacheStore {
    sets: RwLock<Sets>,
    last_sweep: Mutex<Option<Instant>>,
}

/// Drops expired fields and empty sets, returning the number of fields removed
fn drop_expired(sets: &mut Sets, now: Instant) -> usize {
    let mut removed = 0;

    for fields in sets.values_mut() {
        let before = fields.len();
        fields.retain(|_, entry| !entry.is_expired(now));
        removed += before - fields.len();
    }

    sets.retain(|_, fields| !fields.is_empty());
    removed
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes every expired field and any set left empty.
    ///
    /// Returns the number of fields removed.
    pub fn purge_expired(&self) -> Result<usize, DomainError> {
        let now = Instant::now();
        let mut sets = self
            .sets
            .write()
            .map_err(|e| DomainError::cache(format!("Lock error: {}", e)))?;

        Ok(drop_expired(&mut sets, now))
    }

    /// Claims the next sweep if `SWEEP_INTERVAL` has passed since the last one
    fn sweep_due(&self, now: Instant) -> Result<bool, DomainError> {
        let mut last_sweep = self
            .last_sweep
            .lock()
            .map_err(|e| DomainError::cache(format!("Lock error: {}", e)))?;

        match *last_sweep {
            Some(last) if now.duration_since(last) < SWEEP_INTERVAL => Ok(false),
            _ => {
                *last_sweep = Some(now);
                Ok(true)
            }
        }
    }

    /// Number of live fields across all sets
    pub fn len(&self) -> Result<usize, DomainError> {
        let now = Instant::now();
        let sets = self
            .sets
            .read()
            .map_err(|e| DomainError::cache(format!("Lock error: {}", e)))?;

        Ok(sets
            .values()
            .flat_map(|fields| fields.values())
            .filter(|entry| !entry.is_expired(now))
            .count())
    }

    pub fn is_empty(&self) -> Result<bool, DomainError> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get_field(
        &self,
        set_key: &str,
        field_key: &str,
    ) -> Result<Option<Vec<u8>>, DomainError> {
        let now = Instant::now();
        let sets = self
            .sets
            .read()
            .map_err(|e| DomainError::cache(format!("Lock error: {}", e)))?;

        Ok(sets
            .get(set_key)
            .and_then(|fields| fields.get(field_key))
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.data.clone()))
    }

    async fn get_all_fields(&self, set_key: &str) -> Result<HashMap<String, Vec<u8>>, DomainError> {
        let now = Instant::now();
        let mut sets = self
            .sets
            .write()
            .map_err(|e| DomainError::cache(format!("Lock error: {}", e)))?;

        let Some(fields) = sets.get_mut(set_key) else {
            return Ok(HashMap::new());
        };

        fields.retain(|_, entry| !entry.is_expired(now));

        let live = fields
            .iter()
            .map(|(field, entry)| (field.clone(), entry.data.clone()))
            .collect();

        if fields.is_empty() {
            sets.remove(set_key);
        }

        Ok(live)
    }

    async fn set_field(
        &self,
        set_key: &str,
        field_key: &str,
        value: &[u8],
        ttl: Duration,
    ) -> Result<(), DomainError> {
        let now = Instant::now();
        let expires_at = now + ttl.min(MAX_TTL);

        let mut sets = self
            .sets
            .write()
            .map_err(|e| DomainError::cache(format!("Lock error: {}", e)))?;

        if self.sweep_due(now)? {
            let removed = drop_expired(&mut sets, now);
            if removed > 0 {
                debug!(removed, "Swept expired cache fields");
            }
        }

        let fields = sets.entry(set_key.to_string()).or_default();
        fields.retain(|_, entry| !entry.is_expired(now));
        fields.insert(
            field_key.to_string(),
            FieldEntry {
                data: value.to_vec(),
                expires_at,
            },
        );

        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "in_memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn retained_fields(store: &InMemoryCacheStore) -> usize {
        store.sets.read().unwrap().values().map(HashMap::len).sum()
    }

    #[tokio::test]
    async fn test_set_and_get_field() {
        let store = InMemoryCacheStore::new();

        store
            .set_field("q1", "answer", b"{}", Duration::from_secs(60))
            .await
            .unwrap();

        let value = store.get_field("q1", "answer").await.unwrap();
        assert_eq!(value, Some(b"{}".to_vec()));
        assert!(store.get_field("q1", "other").await.unwrap().is_none());
        assert!(store.get_field("q2", "answer").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_all_fields_is_scoped_to_set() {
        let store = InMemoryCacheStore::new();
        let ttl = Duration::from_secs(60);

        store.set_field("q1", "a", b"1", ttl).await.unwrap();
        store.set_field("q1", "b", b"2", ttl).await.unwrap();
        store.set_field("q2", "c", b"3", ttl).await.unwrap();

        let fields = store.get_all_fields("q1").await.unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields.get("a"), Some(&b"1".to_vec()));
        assert_eq!(fields.get("b"), Some(&b"2".to_vec()));
        assert_eq!(store.len().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_set_field_overwrites() {
        let store = InMemoryCacheStore::new();
        let ttl = Duration::from_secs(60);

        store.set_field("q1", "a", b"old", ttl).await.unwrap();
        store.set_field("q1", "a", b"new", ttl).await.unwrap();

        assert_eq!(store.get_field("q1", "a").await.unwrap(), Some(b"new".to_vec()));
        assert_eq!(store.get_all_fields("q1").await.unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fields_expire_independently() {
        let store = InMemoryCacheStore::new();

        store
            .set_field("q1", "short", b"1", Duration::from_secs(10))
            .await
            .unwrap();
        store
            .set_field("q1", "long", b"2", Duration::from_secs(100))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(10)).await;

        assert!(store.get_field("q1", "short").await.unwrap().is_none());
        assert!(store.get_field("q1", "long").await.unwrap().is_some());

        let fields = store.get_all_fields("q1").await.unwrap();
        assert_eq!(fields.len(), 1);
        assert!(fields.contains_key("long"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_overwrite_refreshes_ttl() {
        let store = InMemoryCacheStore::new();
        let ttl = Duration::from_secs(10);

        store.set_field("q1", "a", b"1", ttl).await.unwrap();
        tokio::time::advance(Duration::from_secs(8)).await;
        store.set_field("q1", "a", b"1", ttl).await.unwrap();
        tokio::time::advance(Duration::from_secs(8)).await;

        assert!(store.get_field("q1", "a").await.unwrap().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let store = InMemoryCacheStore::new();

        store
            .set_field("q1", "a", b"1", Duration::from_secs(1))
            .await
            .unwrap();
        store
            .set_field("q2", "b", b"2", Duration::from_secs(60))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(2)).await;

        assert_eq!(store.purge_expired().unwrap(), 1);
        assert_eq!(store.len().unwrap(), 1);
        assert!(!store.is_empty().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_sweeps_untouched_sets() {
        let store = InMemoryCacheStore::new();

        for i in 0..1000 {
            store
                .set_field(&format!("q{}", i), "a", b"1", Duration::from_secs(1))
                .await
                .unwrap();
        }
        assert_eq!(retained_fields(&store), 1000);

        tokio::time::advance(Duration::from_secs(3600)).await;
        store
            .set_field("fresh", "a", b"1", Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(retained_fields(&store), 1);
        assert_eq!(store.len().unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_runs_at_most_once_per_interval() {
        let store = InMemoryCacheStore::new();

        store
            .set_field("q1", "a", b"1", Duration::from_secs(1))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(2)).await;
        store
            .set_field("q2", "b", b"2", Duration::from_secs(600))
            .await
            .unwrap();

        // Expired but not yet swept
        assert_eq!(retained_fields(&store), 2);
        assert_eq!(store.len().unwrap(), 1);

        tokio::time::advance(SWEEP_INTERVAL).await;
        store
            .set_field("q3", "c", b"3", Duration::from_secs(600))
            .await
            .unwrap();

        assert_eq!(retained_fields(&store), 2);
        assert!(store.get_field("q1", "a").await.unwrap().is_none());
    }
}
