use async_trait::async_trait;
use std::fmt::Debug;

use super::{LlmRequest, LlmResponse};
use crate::domain::DomainError;

/// Trait for chat-completion providers
#[async_trait]
pub trait LlmProvider: Send + Sync + Debug {
    /// Send a chat completion request
    async fn chat(&self, model: &str, request: LlmRequest) -> Result<LlmResponse, DomainError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use crate::domain::llm::Message;

    /// Mock provider replaying scripted outcomes.
    ///
    /// Queued outcomes are consumed first; once empty, the fallback response is
    /// returned on every call.
    #[derive(Debug)]
    pub struct MockLlmProvider {
        name: &'static str,
        queue: Mutex<VecDeque<Result<LlmResponse, DomainError>>>,
        fallback: Option<LlmResponse>,
        calls: AtomicUsize,
        requests: Mutex<Vec<LlmRequest>>,
    }

    impl MockLlmProvider {
        pub fn new(name: &'static str) -> Self {
            Self {
                name,
                queue: Mutex::new(VecDeque::new()),
                fallback: None,
                calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn with_response(mut self, response: LlmResponse) -> Self {
            self.fallback = Some(response);
            self
        }

        /// Respond to every call with an assistant message holding `content`
        pub fn with_content(self, content: impl Into<String>) -> Self {
            self.with_response(LlmResponse::new(
                "mock-id".to_string(),
                "mock-model".to_string(),
                Message::assistant(content),
            ))
        }

        /// Queue an error for the next unanswered call
        pub fn then_error(self, error: DomainError) -> Self {
            self.queue.lock().unwrap().push_back(Err(error));
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn requests(&self) -> Vec<LlmRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LlmProvider for MockLlmProvider {
        async fn chat(
            &self,
            _model: &str,
            request: LlmRequest,
        ) -> Result<LlmResponse, DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request);

            if let Some(outcome) = self.queue.lock().unwrap().pop_front() {
                return outcome;
            }

            self.fallback
                .clone()
                .ok_or_else(|| DomainError::internal("No mock response configured"))
        }

        fn provider_name(&self) -> &'static str {
            self.name
        }
    }
}
