//! Outcome of resolving one answer

use serde::Serialize;

use crate::domain::evaluation::Evaluation;

/// Which path produced an evaluation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolutionSource {
    /// Identical normalized text was already cached
    ExactMatch,
    /// A cached answer was similar enough
    Similar { similarity: f64 },
    /// The evaluator graded the answer
    Fresh,
    /// The evaluator graded the answer while embeddings were unavailable
    FreshDegraded,
}

impl ResolutionSource {
    pub fn is_cache_hit(&self) -> bool {
        matches!(
            self,
            ResolutionSource::ExactMatch | ResolutionSource::Similar { .. }
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionSource::ExactMatch => "exact_match",
            ResolutionSource::Similar { .. } => "similar",
            ResolutionSource::Fresh => "fresh",
            ResolutionSource::FreshDegraded => "fresh_degraded",
        }
    }
}

/// Evaluation together with the path that produced it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub evaluation: Evaluation,
    pub source: ResolutionSource,
}

impl Resolution {
    pub fn new(evaluation: Evaluation, source: ResolutionSource) -> Self {
        Self { evaluation, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_hit_classification() {
        assert!(ResolutionSource::ExactMatch.is_cache_hit());
        assert!(ResolutionSource::Similar { similarity: 0.93 }.is_cache_hit());
        assert!(!ResolutionSource::Fresh.is_cache_hit());
        assert!(!ResolutionSource::FreshDegraded.is_cache_hit());
    }

    #[test]
    fn test_serialization() {
        let resolution = Resolution::new(
            Evaluation::new(0.5, "partial"),
            ResolutionSource::Similar { similarity: 0.95 },
        );

        let json = serde_json::to_value(&resolution).unwrap();
        assert_eq!(json["source"]["kind"], "similar");
        assert_eq!(json["source"]["similarity"], 0.95);
        assert_eq!(json["evaluation"]["score"], 0.5);
    }
}
