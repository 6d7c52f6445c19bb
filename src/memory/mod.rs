//! Core memory engine: entries, the store, clustering, and snapshots.

pub mod cluster;
pub mod snapshot;
pub mod store;
pub mod types;

pub use cluster::{Clusterer, Clustering, KMeans};
pub use store::{MemoryStore, StoreStats};
pub use types::MemoryEntry;
