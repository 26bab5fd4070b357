//! Prometheus metrics for the answer cache
//!
//! Recording goes through the `metrics` facade and is a no-op until a
//! recorder is installed with [`init_metrics`].

use std::sync::Arc;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::domain::DomainError;

/// Which path answered a lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOutcome {
    ExactHit,
    SimilarHit,
    Miss,
}

impl LookupOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            LookupOutcome::ExactHit => "exact_hit",
            LookupOutcome::SimilarHit => "similar_hit",
            LookupOutcome::Miss => "miss",
        }
    }
}

/// Store operation that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOperation {
    Read,
    Write,
}

impl StoreOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreOperation::Read => "read",
            StoreOperation::Write => "write",
        }
    }
}

/// Prometheus handle for rendering the exposition text
#[derive(Clone)]
pub struct PrometheusMetrics {
    handle: Arc<PrometheusHandle>,
}

impl PrometheusMetrics {
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Install the global Prometheus recorder
pub fn init_metrics() -> Result<PrometheusMetrics, DomainError> {
    let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
        DomainError::configuration(format!("Failed to install Prometheus recorder: {}", e))
    })?;

    gauge!("answer_cache_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
    tracing::info!("Prometheus metrics recorder installed");

    Ok(PrometheusMetrics {
        handle: Arc::new(handle),
    })
}

pub fn record_lookup(outcome: LookupOutcome) {
    counter!("answer_cache_lookups_total", "outcome" => outcome.as_str()).increment(1);
}

pub fn record_store_error(operation: StoreOperation) {
    counter!("answer_cache_store_errors_total", "operation" => operation.as_str()).increment(1);
}

/// Count an upstream failure; non-upstream errors are ignored
pub fn record_upstream_error(error: &DomainError) {
    if let DomainError::Upstream { service, kind, .. } = error {
        counter!(
            "answer_cache_upstream_errors_total",
            "service" => service.as_str(),
            "kind" => kind.as_str()
        )
        .increment(1);
    }
}

pub fn record_degraded() {
    counter!("answer_cache_degraded_total").increment(1);
}

pub fn record_best_similarity(similarity: f64) {
    histogram!("answer_cache_best_similarity").record(similarity);
}

pub fn record_single_flight_join() {
    counter!("answer_cache_single_flight_joins_total").increment(1);
}
