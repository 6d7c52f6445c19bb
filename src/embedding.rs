//! External collaborator boundaries.
//!
//! The engine never produces embeddings or concept labels itself — both
//! require a language model and are supplied by the host through the
//! [`EmbeddingProvider`] and [`ConceptExtractor`] traits. Vectors must have
//! a fixed dimension, chosen once per store instance.

use std::collections::BTreeSet;

use crate::error::Result;

/// Default embedding dimension (all-MiniLM-L6-v2 and friends).
pub const DEFAULT_EMBEDDING_DIM: usize = 384;

/// Trait for embedding text into vectors.
///
/// Implementations produce vectors of exactly `dimensions()` entries, the
/// same dimension for every call over the provider's lifetime. All methods
/// are synchronous.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text string into a vector.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of text strings. Implementations may override for
    /// batched inference.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// Return the number of dimensions this provider produces.
    fn dimensions(&self) -> usize {
        DEFAULT_EMBEDDING_DIM
    }
}

/// Trait for extracting concept labels from text.
///
/// Implementations return lowercase labels. `known` carries the labels the
/// store has already seen, so extractors can bias toward vocabulary reuse.
pub trait ConceptExtractor: Send + Sync {
    /// Extract a set of lowercase concept labels from `text`.
    fn extract(&self, text: &str, known: &BTreeSet<String>) -> Result<BTreeSet<String>>;
}

/// Cosine similarity between two vectors.
///
/// Returns 0.0 when either vector has zero norm; callers that need to treat
/// a zero-norm embedding as corrupt should check norms themselves.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += f64::from(*x) * f64::from(*y);
        norm_a += f64::from(*x) * f64::from(*x);
        norm_b += f64::from(*y) * f64::from(*y);
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
