//! Concept graph and spreading activation.

pub mod activation;
pub mod concept;

pub use activation::{spread, SpreadParams};
pub use concept::{ConceptEdge, ConceptGraph, RelationKind};
