#![allow(dead_code)]

use std::collections::BTreeSet;

use mnemo::{MemoryStore, MnemoConfig};
use tracing_subscriber::EnvFilter;

/// Embedding dimension used across integration tests.
pub const DIM: usize = 8;

/// Install a test subscriber so engine warn logs surface in failing tests.
/// Safe to call from every test; only the first call wins.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Open a fresh store with the default configuration.
pub fn test_store() -> MemoryStore {
    init_tracing();
    MemoryStore::new(DIM).unwrap()
}

/// Open a fresh store with a caller-tweaked configuration.
pub fn test_store_with(configure: impl FnOnce(&mut MnemoConfig)) -> MemoryStore {
    init_tracing();
    let mut config = MnemoConfig::default();
    configure(&mut config);
    MemoryStore::with_config(DIM, config).unwrap()
}

/// Deterministic embedding with a spike at position `axis`.
/// Each axis produces a distinct, orthogonal vector.
pub fn test_embedding(axis: usize) -> Vec<f32> {
    let mut v = vec![0.0f32; DIM];
    v[axis % DIM] = 1.0;
    v
}

/// Embedding close to `base` (high cosine similarity), L2-normalized.
pub fn similar_embedding(base: &[f32]) -> Vec<f32> {
    let mut v = base.to_vec();
    for x in &mut v {
        *x += 0.05;
    }
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut v {
            *x /= norm;
        }
    }
    v
}

/// Concept label set from string literals.
pub fn concepts(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}
