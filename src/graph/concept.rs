//! Typed, weighted multigraph over concept labels.
//!
//! Concepts are unique string labels; edges carry a [`RelationKind`] and an
//! accumulating weight, so the same pair of concepts may be connected by
//! several edges of different kinds. The live structure is an adjacency map
//! plus an edge index for O(1) existence and accumulation checks — JSON only
//! appears at the snapshot boundary, never on mutation.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, VecDeque};

use crate::error::{MemoryError, Result};

/// The typed category of a concept edge.
///
/// The kind controls how spreading activation propagates: generalizing kinds
/// (is-a, part-of, instance-of) flow upward at a different strength than
/// plain associations or downward specialization hops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// Undirected co-occurrence, stored as a symmetric pair of edges.
    Association,
    /// `child is-a parent` — flows toward generalization.
    IsA,
    /// `whole has-a part`.
    HasA,
    /// `instance instance-of class` — flows toward generalization.
    InstanceOf,
    /// `part part-of whole` — flows toward generalization.
    PartOf,
}

impl RelationKind {
    /// String representation used in snapshots and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Association => "association",
            Self::IsA => "is_a",
            Self::HasA => "has_a",
            Self::InstanceOf => "instance_of",
            Self::PartOf => "part_of",
        }
    }

    /// Whether this kind points from specific to general.
    ///
    /// Generalizing edges take the upward activation factor when followed
    /// forward and the downward factor when walked in reverse.
    pub fn is_generalizing(&self) -> bool {
        matches!(self, Self::IsA | Self::PartOf | Self::InstanceOf)
    }
}

impl std::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RelationKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "association" => Ok(Self::Association),
            "is_a" => Ok(Self::IsA),
            "has_a" => Ok(Self::HasA),
            "instance_of" => Ok(Self::InstanceOf),
            "part_of" => Ok(Self::PartOf),
            _ => Err(format!("unknown relation kind: {s}")),
        }
    }
}

/// A directed, weighted, typed edge between two concepts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConceptEdge {
    /// Source concept label.
    pub source: String,
    /// Target concept label.
    pub target: String,
    /// Typed category of the edge.
    pub kind: RelationKind,
    /// Accumulated weight, never negative.
    pub weight: f64,
    /// Arbitrary metadata attached when the edge was first created.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// Traversal direction for transitive closures.
#[derive(Clone, Copy)]
enum Direction {
    Up,
    Down,
}

/// Typed, weighted multigraph over concept labels.
#[derive(Debug, Clone, Default)]
pub struct ConceptGraph {
    /// Outgoing edges per source concept, in insertion order.
    outgoing: HashMap<String, Vec<ConceptEdge>>,
    /// (source, target, kind) → index into `outgoing[source]`.
    edge_index: HashMap<(String, String, RelationKind), usize>,
    /// Incoming (source, kind) pairs per target concept, for reverse walks.
    incoming: HashMap<String, Vec<(String, RelationKind)>>,
}

impl ConceptGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure a concept node exists, with no edges if new.
    pub fn ensure_node(&mut self, label: &str) {
        self.outgoing.entry(label.to_string()).or_default();
    }

    /// Whether a concept node exists.
    pub fn contains(&self, label: &str) -> bool {
        self.outgoing.contains_key(label)
    }

    /// Number of concept nodes.
    pub fn node_count(&self) -> usize {
        self.outgoing.len()
    }

    /// Number of directed edges.
    pub fn edge_count(&self) -> usize {
        self.edge_index.len()
    }

    /// Iterate over all concept labels, in no particular order.
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.outgoing.keys().map(String::as_str)
    }

    /// Outgoing edges of a concept, in insertion order. Empty for unknown
    /// concepts.
    pub fn outgoing_edges(&self, label: &str) -> &[ConceptEdge] {
        self.outgoing.get(label).map_or(&[], Vec::as_slice)
    }

    /// Incoming (source, kind) pairs of a concept, in insertion order.
    pub fn incoming_links(&self, label: &str) -> &[(String, RelationKind)] {
        self.incoming.get(label).map_or(&[], Vec::as_slice)
    }

    /// Weight of the (source, target, kind) edge, if present.
    pub fn edge_weight(&self, source: &str, target: &str, kind: RelationKind) -> Option<f64> {
        let key = (source.to_string(), target.to_string(), kind);
        let idx = *self.edge_index.get(&key)?;
        Some(self.outgoing[source][idx].weight)
    }

    /// Iterate over every directed edge in the graph.
    pub fn edges(&self) -> impl Iterator<Item = &ConceptEdge> {
        self.outgoing.values().flatten()
    }

    /// Register a set of co-occurring concepts.
    ///
    /// Ensures a node for every label, then connects every unordered pair
    /// with symmetric association edges: both directions are created at
    /// weight 1 or incremented by 1.
    pub fn add_concepts(&mut self, labels: &BTreeSet<String>) {
        for label in labels {
            self.ensure_node(label);
        }
        // BTreeSet iteration keeps pair order stable across calls.
        let ordered: Vec<&String> = labels.iter().collect();
        for (i, a) in ordered.iter().enumerate() {
            for b in &ordered[i + 1..] {
                self.bump_edge(a, b, RelationKind::Association, 1.0, serde_json::Map::new());
                self.bump_edge(b, a, RelationKind::Association, 1.0, serde_json::Map::new());
            }
        }
    }

    /// Add or strengthen a typed relation between two concepts.
    ///
    /// Both nodes are created if missing. Repeated insertion of the same
    /// (source, target, kind) accumulates weight rather than replacing it;
    /// metadata is kept from the first insertion.
    pub fn add_relation(
        &mut self,
        child: &str,
        parent: &str,
        kind: RelationKind,
        weight: f64,
        metadata: serde_json::Map<String, serde_json::Value>,
    ) -> Result<()> {
        if weight < 0.0 || weight.is_nan() {
            return Err(MemoryError::validation(format!(
                "relation weight must be non-negative, got {weight}"
            )));
        }
        self.ensure_node(child);
        self.ensure_node(parent);
        self.bump_edge(child, parent, kind, weight, metadata);
        Ok(())
    }

    /// Concepts reached by one outgoing edge of the given kind.
    pub fn parents(&self, concept: &str, kind: RelationKind) -> BTreeSet<String> {
        self.outgoing_edges(concept)
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| e.target.clone())
            .collect()
    }

    /// Concepts reached by one incoming edge of the given kind.
    pub fn children(&self, concept: &str, kind: RelationKind) -> BTreeSet<String> {
        self.incoming_links(concept)
            .iter()
            .filter(|(_, k)| *k == kind)
            .map(|(source, _)| source.clone())
            .collect()
    }

    /// Transitive closure over `parents`, excluding `concept` itself.
    ///
    /// BFS with a visited set, so cyclic hierarchies terminate.
    pub fn ancestors(&self, concept: &str, kind: RelationKind) -> BTreeSet<String> {
        self.closure(concept, kind, Direction::Up)
    }

    /// Transitive closure over `children`, excluding `concept` itself.
    pub fn descendants(&self, concept: &str, kind: RelationKind) -> BTreeSet<String> {
        self.closure(concept, kind, Direction::Down)
    }

    fn closure(&self, concept: &str, kind: RelationKind, direction: Direction) -> BTreeSet<String> {
        let mut result = BTreeSet::new();
        let mut visited = BTreeSet::new();
        let mut frontier = VecDeque::new();
        visited.insert(concept.to_string());
        frontier.push_back(concept.to_string());

        while let Some(current) = frontier.pop_front() {
            let next = match direction {
                Direction::Up => self.parents(&current, kind),
                Direction::Down => self.children(&current, kind),
            };
            for label in next {
                if visited.insert(label.clone()) {
                    result.insert(label.clone());
                    frontier.push_back(label);
                }
            }
        }
        result
    }

    /// Create the (source, target, kind) edge or accumulate onto it.
    fn bump_edge(
        &mut self,
        source: &str,
        target: &str,
        kind: RelationKind,
        weight: f64,
        metadata: serde_json::Map<String, serde_json::Value>,
    ) {
        let key = (source.to_string(), target.to_string(), kind);
        if let Some(&idx) = self.edge_index.get(&key) {
            let edges = self.outgoing.get_mut(source).expect("indexed source exists");
            edges[idx].weight += weight;
            return;
        }

        let edges = self.outgoing.entry(source.to_string()).or_default();
        edges.push(ConceptEdge {
            source: source.to_string(),
            target: target.to_string(),
            kind,
            weight,
            metadata,
        });
        self.edge_index.insert(key, edges.len() - 1);
        self.incoming
            .entry(target.to_string())
            .or_default()
            .push((source.to_string(), kind));
    }
}
