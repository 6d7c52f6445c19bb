//! Associative memory for AI agents — recall by similarity, association,
//! and reinforcement.
//!
//! Mnemo is a concept-graph-backed store that lets an agent recall prior
//! interactions by combining four signals per entry:
//!
//! | Signal | Source | Behavior |
//! |--------|--------|----------|
//! | **Similarity** | cosine over embeddings | relevance gate and base score |
//! | **Time decay** | entry age | exponential, refreshed on recall |
//! | **Reinforcement** | access count | logarithmic boost for familiar entries |
//! | **Activation** | spreading activation over the concept graph | boost for conceptually related entries |
//!
//! Retrieval is side-effectful: returned entries are reinforced (×1.1 decay
//! factor, access count bumped, timestamp refreshed) and all other
//! short-term entries decay (×0.9). An entry retrieved often enough is
//! copied into long-term memory once; nothing is ever deleted.
//!
//! # Architecture
//!
//! - **Storage**: in-memory adjacency maps and entry lists; JSON snapshots
//!   only at explicit save/load, never on mutation
//! - **Concept graph**: typed, weighted multigraph (association, is-a,
//!   has-a, instance-of, part-of) with accumulating edge weights
//! - **Activation**: deterministic bounded-depth spreading activation with
//!   best-path (max) semantics
//! - **Cluster fallback**: deterministic k-means over entry embeddings for
//!   coarse retrieval when graph signal is weak
//! - **Embeddings**: supplied by the host through the
//!   [`embedding::EmbeddingProvider`] boundary trait — the engine never
//!   runs a model
//!
//! # Modules
//!
//! - [`config`] — Configuration loading from TOML files and environment variables
//! - [`error`] — The [`MemoryError`] taxonomy shared by every operation
//! - [`embedding`] — Embedding/concept-extraction collaborator traits and vector math
//! - [`graph`] — Concept graph and spreading activation
//! - [`memory`] — The store: insertion, retrieval, clustering, snapshots

pub mod config;
pub mod embedding;
pub mod error;
pub mod graph;
pub mod memory;

pub use config::MnemoConfig;
pub use error::{MemoryError, Result};
pub use graph::{ConceptGraph, RelationKind, SpreadParams};
pub use memory::{MemoryEntry, MemoryStore};
