//! Embedding provider trait definition

use async_trait::async_trait;
use std::fmt::Debug;

use super::{EmbeddingRequest, EmbeddingResponse};
use crate::domain::DomainError;

/// Trait for embedding providers (OpenAI, local models, etc.)
///
/// Failures are reported as `DomainError::Upstream` attributed to
/// `UpstreamService::Embedding`.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync + Debug {
    /// Generate an embedding for the given input
    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, DomainError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;

    /// Get the embedding dimensions for a model
    fn dimensions(&self, model: &str) -> Option<usize>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use crate::domain::embedding::EmbeddingUsage;
    use crate::domain::error::UpstreamService;

    /// Mock embedding provider.
    ///
    /// Texts registered with `with_vector` map to fixed vectors; any other
    /// text gets a deterministic vector derived from its bytes.
    #[derive(Debug)]
    pub struct MockEmbeddingProvider {
        name: &'static str,
        dimensions: usize,
        vectors: Mutex<HashMap<String, Vec<f32>>>,
        error: Option<DomainError>,
        delay: Option<std::time::Duration>,
        calls: AtomicUsize,
    }

    impl MockEmbeddingProvider {
        pub fn new(name: &'static str, dimensions: usize) -> Self {
            Self {
                name,
                dimensions,
                vectors: Mutex::new(HashMap::new()),
                error: None,
                delay: None,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn with_vector(self, text: impl Into<String>, vector: Vec<f32>) -> Self {
            self.vectors.lock().unwrap().insert(text.into(), vector);
            self
        }

        pub fn with_error(mut self, error: impl Into<String>) -> Self {
            self.error = Some(DomainError::unavailable(
                UpstreamService::Embedding,
                error.into(),
            ));
            self
        }

        pub fn rate_limited(mut self) -> Self {
            self.error = Some(DomainError::rate_limited(
                UpstreamService::Embedding,
                "HTTP 429 Too Many Requests",
            ));
            self
        }

        pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn derived_vector(&self, text: &str) -> Vec<f32> {
            let hash = text
                .bytes()
                .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));

            (0..self.dimensions)
                .map(|i| ((hash.wrapping_add(i as u64 * 7919) % 1000) as f32 / 1000.0) - 0.5)
                .collect()
        }
    }

    #[async_trait]
    impl EmbeddingProvider for MockEmbeddingProvider {
        async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            if let Some(ref error) = self.error {
                return Err(error.clone());
            }

            let vector = self
                .vectors
                .lock()
                .unwrap()
                .get(request.input())
                .cloned()
                .unwrap_or_else(|| self.derived_vector(request.input()));

            let tokens = (request.input().len() / 4) as u32;

            Ok(EmbeddingResponse::new(
                request.model(),
                vector,
                EmbeddingUsage::new(tokens, tokens),
            ))
        }

        fn provider_name(&self) -> &'static str {
            self.name
        }

        fn dimensions(&self, _model: &str) -> Option<usize> {
            Some(self.dimensions)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_provider_registered_vector() {
            let provider =
                MockEmbeddingProvider::new("test", 3).with_vector("hello", vec![1.0, 0.0, 0.0]);

            let response = provider
                .embed(EmbeddingRequest::new("mock", "hello"))
                .await
                .unwrap();

            assert_eq!(response.vector(), &[1.0, 0.0, 0.0]);
            assert_eq!(provider.calls(), 1);
        }

        #[tokio::test]
        async fn test_mock_provider_deterministic() {
            let provider = MockEmbeddingProvider::new("test", 64);

            let first = provider
                .embed(EmbeddingRequest::new("mock", "Hello"))
                .await
                .unwrap();
            let second = provider
                .embed(EmbeddingRequest::new("mock", "Hello"))
                .await
                .unwrap();

            assert_eq!(first.vector(), second.vector());
            assert_eq!(first.dimensions(), 64);
        }

        #[tokio::test]
        async fn test_mock_provider_error() {
            let provider = MockEmbeddingProvider::new("test", 8).with_error("API error");

            let result = provider.embed(EmbeddingRequest::new("mock", "Hello")).await;

            assert!(matches!(result, Err(DomainError::Upstream { .. })));
        }
    }
}
