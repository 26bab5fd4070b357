//! Cache domain - hash-per-key store abstraction

mod store;

pub use store::{CacheStore, CacheStoreExt};

#[cfg(test)]
pub use store::mock::MockCacheStore;
