use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::domain::error::UpstreamService;
use crate::domain::DomainError;

/// Trait for HTTP client operations (for mocking)
#[async_trait]
pub trait HttpClientTrait: Send + Sync + std::fmt::Debug {
    async fn post_json(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, DomainError>;
}

/// Real HTTP client using reqwest.
///
/// Errors are attributed to `UpstreamService::Http`; callers re-attribute
/// them to the service they were talking to.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a non-success status to the upstream error kind it represents
fn status_error(status: StatusCode, body: &str) -> DomainError {
    let message = format!("HTTP {}: {}", status, body);

    if status == StatusCode::TOO_MANY_REQUESTS {
        DomainError::rate_limited(UpstreamService::Http, message)
    } else {
        DomainError::unavailable(UpstreamService::Http, message)
    }
}

#[async_trait]
impl HttpClientTrait for HttpClient {
    async fn post_json(
        &self,
        url: &str,
        headers: Vec<(&str, &str)>,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, DomainError> {
        let mut request = self.client.post(url);

        for (key, value) in headers {
            request = request.header(key, value);
        }

        let response = request.json(body).send().await.map_err(|e| {
            DomainError::unavailable(UpstreamService::Http, format!("Request failed: {}", e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &error_body));
        }

        response.json().await.map_err(|e| {
            DomainError::malformed_response(
                UpstreamService::Http,
                format!("Failed to parse response: {}", e),
            )
        })
    }
}
