//! LLM provider implementations

mod http_client;
mod openai;
mod retry;

pub use http_client::{HttpClient, HttpClientTrait};
pub use openai::OpenAiProvider;
pub use retry::RetryConfig;

#[cfg(test)]
pub use http_client::mock::MockHttpClient;
