use std::fmt;

use thiserror::Error;

/// External service an upstream failure is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamService {
    /// Embedding provider (vectorizes answer text)
    Embedding,
    /// Evaluator (grades an answer against the model answers)
    Evaluator,
    /// Raw HTTP transport, not yet attributed to a collaborator
    Http,
}

impl UpstreamService {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpstreamService::Embedding => "embedding",
            UpstreamService::Evaluator => "evaluator",
            UpstreamService::Http => "http",
        }
    }
}

impl fmt::Display for UpstreamService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure class of an upstream call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamErrorKind {
    Unavailable,
    RateLimited,
    MalformedResponse,
}

impl UpstreamErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpstreamErrorKind::Unavailable => "unavailable",
            UpstreamErrorKind::RateLimited => "rate_limited",
            UpstreamErrorKind::MalformedResponse => "malformed_response",
        }
    }

    /// Whether a retry has a chance of succeeding
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            UpstreamErrorKind::Unavailable | UpstreamErrorKind::RateLimited
        )
    }
}

impl fmt::Display for UpstreamErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Core domain errors
#[derive(Debug, Clone, Error)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Upstream {service} error ({kind}): {message}")]
    Upstream {
        service: UpstreamService,
        kind: UpstreamErrorKind,
        message: String,
    },

    #[error("Cache unavailable: {message}")]
    CacheUnavailable { message: String },

    #[error("Invariant violation: {message}")]
    InvariantViolation { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Cancelled: {message}")]
    Cancelled { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch { expected, actual }
    }

    pub fn upstream(
        service: UpstreamService,
        kind: UpstreamErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self::Upstream {
            service,
            kind,
            message: message.into(),
        }
    }

    pub fn unavailable(service: UpstreamService, message: impl Into<String>) -> Self {
        Self::upstream(service, UpstreamErrorKind::Unavailable, message)
    }

    pub fn rate_limited(service: UpstreamService, message: impl Into<String>) -> Self {
        Self::upstream(service, UpstreamErrorKind::RateLimited, message)
    }

    pub fn malformed_response(service: UpstreamService, message: impl Into<String>) -> Self {
        Self::upstream(service, UpstreamErrorKind::MalformedResponse, message)
    }

    pub fn cache(message: impl Into<String>) -> Self {
        Self::CacheUnavailable {
            message: message.into(),
        }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::Cancelled {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Re-attributes an upstream error to the given collaborator.
    ///
    /// Non-upstream errors are returned unchanged.
    pub fn attributed_to(self, service: UpstreamService) -> Self {
        match self {
            Self::Upstream { kind, message, .. } => Self::Upstream {
                service,
                kind,
                message,
            },
            other => other,
        }
    }

    /// Stable label naming the stage or collaborator that failed
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Validation { .. } | Self::NotFound { .. } => "validation",
            Self::InvalidInput { .. } | Self::DimensionMismatch { .. } => "similarity",
            Self::Upstream { service, .. } => service.as_str(),
            Self::CacheUnavailable { .. } => "cache",
            Self::InvariantViolation { .. } => "invariant",
            Self::Configuration { .. } => "configuration",
            Self::Cancelled { .. } => "cancelled",
            Self::Internal { .. } => "internal",
        }
    }

    pub fn upstream_kind(&self) -> Option<UpstreamErrorKind> {
        match self {
            Self::Upstream { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
