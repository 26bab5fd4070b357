//! Vector similarity
//!
//! Cosine similarity between embedding vectors, accumulated in `f64`
//! regardless of the element width of the inputs.

use crate::domain::DomainError;

/// Element types an embedding vector may be stored as
pub trait VectorElement: Copy {
    fn to_f64(self) -> f64;
}

impl VectorElement for f32 {
    fn to_f64(self) -> f64 {
        self as f64
    }
}

impl VectorElement for f64 {
    fn to_f64(self) -> f64 {
        self
    }
}

/// Cosine similarity of `a` and `b`, in `[-1, 1]`.
///
/// Both vectors must be non-empty, of equal length and contain only finite
/// values. A vector with zero magnitude is unrelated to everything and yields
/// exactly `0.0`.
pub fn cosine_similarity<T: VectorElement>(a: &[T], b: &[T]) -> Result<f64, DomainError> {
    if a.is_empty() || b.is_empty() {
        return Err(DomainError::invalid_input(
            "Cannot compare empty embedding vectors",
        ));
    }

    if a.len() != b.len() {
        return Err(DomainError::dimension_mismatch(a.len(), b.len()));
    }

    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = x.to_f64();
        let y = y.to_f64();

        if !x.is_finite() || !y.is_finite() {
            return Err(DomainError::invalid_input(
                "Embedding vectors must contain only finite values",
            ));
        }

        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    // Rounding can push |cos| a hair past 1 for near-parallel vectors
    Ok((dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0))
}
