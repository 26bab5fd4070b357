//! Cache infrastructure - Cache store implementations

mod factory;
mod in_memory;
mod redis;

pub use factory::{CacheStoreConfig, CacheStoreFactory, CacheStoreType};
pub use in_memory::InMemoryCacheStore;
pub use redis::{RedisCacheStore, RedisCacheStoreConfig};
