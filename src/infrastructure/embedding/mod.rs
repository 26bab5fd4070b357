//! Embedding provider implementations

mod cached;
mod openai;

pub use cached::{CachedEmbeddingProvider, EmbeddingCacheConfig};
pub use openai::OpenAiEmbeddingProvider;

// Re-export HTTP client for use by embedding providers
pub use super::llm::{HttpClient, HttpClientTrait};
