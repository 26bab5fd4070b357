//! Keyed single-flight coalescing
//!
//! Concurrent callers presenting the same key share one execution of the
//! work; callers with different keys never wait on each other.

use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::time::Duration;

use moka::future::Cache as MokaCache;

use crate::domain::DomainError;

/// Upper bound on how long a finished outcome can outlive its executing
/// caller when that caller is dropped before forgetting it
pub const DEFAULT_OUTCOME_TTL: Duration = Duration::from_secs(5);

/// Result of a coalesced call
#[derive(Debug, Clone, PartialEq)]
pub struct Flight<V> {
    pub value: V,
    /// The caller awaited another caller's execution
    pub joined: bool,
}

/// Registry of in-flight computations
pub struct SingleFlight<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    inflight: MokaCache<K, V>,
}

impl<K, V> fmt::Debug for SingleFlight<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingleFlight")
            .field("inflight", &self.inflight.entry_count())
            .finish()
    }
}

impl<K, V> Default for SingleFlight<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> SingleFlight<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::with_outcome_ttl(DEFAULT_OUTCOME_TTL)
    }

    /// Registry whose finished outcomes are evicted after `ttl` at the latest
    pub fn with_outcome_ttl(ttl: Duration) -> Self {
        Self {
            inflight: MokaCache::builder().time_to_live(ttl).build(),
        }
    }

    /// Runs `work` unless an execution for `key` is already in flight, in
    /// which case its outcome (value or error) is shared.
    ///
    /// The outcome is forgotten as soon as the executing caller finishes, so
    /// a later call with the same key runs `work` again. If the executing
    /// caller is dropped, one of the waiters takes over.
    pub async fn run<F>(&self, key: K, work: F) -> Result<Flight<V>, DomainError>
    where
        F: Future<Output = Result<V, DomainError>>,
    {
        let mut executed = false;

        let outcome = self
            .inflight
            .try_get_with(key.clone(), async {
                executed = true;
                work.await
            })
            .await;

        if executed {
            self.inflight.invalidate(&key).await;
        }

        match outcome {
            Ok(value) => Ok(Flight {
                value,
                joined: !executed,
            }),
            Err(e) => Err((*e).clone()),
        }
    }
}
