//! Bounded-depth spreading activation over a [`ConceptGraph`].
//!
//! [`spread`] is a pure function of the graph, the seed set, and the
//! parameters: no randomness, no I/O, identical output on every call.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use tracing::trace;

use crate::config::ActivationConfig;
use crate::error::{MemoryError, Result};
use crate::graph::concept::{ConceptGraph, RelationKind};

/// Propagation parameters for one spread.
#[derive(Debug, Clone, Copy)]
pub struct SpreadParams {
    /// Base factor applied on every hop.
    pub decay: f64,
    /// Extra factor for generalizing edges followed forward (specific → general).
    pub upward: f64,
    /// Extra factor for other edge kinds and for reverse specialization hops.
    pub downward: f64,
    /// Hop limit from any seed.
    pub max_depth: usize,
}

impl Default for SpreadParams {
    fn default() -> Self {
        Self {
            decay: 0.5,
            upward: 0.8,
            downward: 0.6,
            max_depth: 3,
        }
    }
}

impl From<&ActivationConfig> for SpreadParams {
    fn from(config: &ActivationConfig) -> Self {
        Self {
            decay: config.decay,
            upward: config.upward,
            downward: config.downward,
            max_depth: config.max_depth,
        }
    }
}

impl SpreadParams {
    /// Reject non-positive factors and a zero depth.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("decay", self.decay),
            ("upward", self.upward),
            ("downward", self.downward),
        ] {
            if value <= 0.0 || value.is_nan() {
                return Err(MemoryError::configuration(format!(
                    "spread {name} must be strictly positive, got {value}"
                )));
            }
        }
        if self.max_depth == 0 {
            return Err(MemoryError::configuration(
                "spread max_depth must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Spread activation from `seeds` across the graph.
///
/// Every seed starts at activation 1.0 (whether or not it has a node). The
/// frontier is FIFO over (concept, depth) pairs; each concept is expanded at
/// most once and a branch stops once `depth >= max_depth`. Forward edges
/// propagate `current × factor × weight` where the factor is `decay` for
/// associations, `decay × upward` for generalizing kinds, and
/// `decay × downward` otherwise. Generalizing edges are also walked in
/// reverse (parent → child) at `decay × downward`, so specializations receive
/// activation too. A neighbor keeps the best value seen: its score is only
/// updated, and the neighbor only re-enqueued, when the new value is strictly
/// greater.
pub fn spread(
    graph: &ConceptGraph,
    seeds: &BTreeSet<String>,
    params: SpreadParams,
) -> Result<HashMap<String, f64>> {
    params.validate()?;

    let mut activation: HashMap<String, f64> = HashMap::new();
    let mut frontier: VecDeque<(String, usize)> = VecDeque::new();
    let mut expanded: HashSet<String> = HashSet::new();

    // BTreeSet order makes the frontier order reproducible.
    for seed in seeds {
        activation.insert(seed.clone(), 1.0);
        frontier.push_back((seed.clone(), 0));
    }

    while let Some((concept, depth)) = frontier.pop_front() {
        if depth >= params.max_depth {
            continue;
        }
        if !expanded.insert(concept.clone()) {
            continue;
        }
        let current = activation[&concept];
        trace!(%concept, depth, current, "expanding");

        for edge in graph.outgoing_edges(&concept) {
            let factor = if edge.kind.is_generalizing() {
                params.decay * params.upward
            } else if edge.kind == RelationKind::Association {
                params.decay
            } else {
                params.decay * params.downward
            };
            let value = current * factor * edge.weight;
            if improves(&activation, &edge.target, value) {
                activation.insert(edge.target.clone(), value);
                frontier.push_back((edge.target.clone(), depth + 1));
            }
        }

        // Reverse walk: parent → child along generalizing edges.
        for (child, kind) in graph.incoming_links(&concept) {
            if !kind.is_generalizing() {
                continue;
            }
            let weight = graph
                .edge_weight(child, &concept, *kind)
                .unwrap_or_default();
            let value = current * params.decay * params.downward * weight;
            if improves(&activation, child, value) {
                activation.insert(child.clone(), value);
                frontier.push_back((child.clone(), depth + 1));
            }
        }
    }

    Ok(activation)
}

fn improves(activation: &HashMap<String, f64>, concept: &str, value: f64) -> bool {
    value > activation.get(concept).copied().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::concept::RelationKind;

    fn seeds(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn taxonomy() -> ConceptGraph {
        let mut graph = ConceptGraph::new();
        graph
            .add_relation("cat", "feline", RelationKind::IsA, 1.0, Default::default())
            .unwrap();
        graph
            .add_relation("feline", "mammal", RelationKind::IsA, 1.0, Default::default())
            .unwrap();
        graph
    }

    #[test]
    fn seed_keeps_full_activation() {
        let result = spread(&taxonomy(), &seeds(&["cat"]), SpreadParams::default()).unwrap();
        assert_eq!(result["cat"], 1.0);
    }

    #[test]
    fn upward_chain_matches_worked_example() {
        // cat -IsA-> feline -IsA-> mammal with decay 0.5, upward 0.8:
        // feline = 1.0 * 0.4, mammal = 0.4 * 0.4.
        let result = spread(&taxonomy(), &seeds(&["cat"]), SpreadParams::default()).unwrap();
        assert!((result["feline"] - 0.4).abs() < 1e-9);
        assert!((result["mammal"] - 0.16).abs() < 1e-9);
    }

    #[test]
    fn association_uses_base_decay() {
        let mut graph = ConceptGraph::new();
        graph.add_concepts(&seeds(&["coffee", "morning"]));
        let result = spread(&graph, &seeds(&["coffee"]), SpreadParams::default()).unwrap();
        assert!((result["morning"] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn has_a_uses_downward_factor() {
        let mut graph = ConceptGraph::new();
        graph
            .add_relation("car", "wheel", RelationKind::HasA, 1.0, Default::default())
            .unwrap();
        let result = spread(&graph, &seeds(&["car"]), SpreadParams::default()).unwrap();
        assert!((result["wheel"] - 0.3).abs() < 1e-9);
    }

    #[test]
    fn reverse_specialization_receives_activation() {
        // Seeding the parent reaches the child through the reverse IsA walk.
        let result = spread(&taxonomy(), &seeds(&["feline"]), SpreadParams::default()).unwrap();
        assert!((result["cat"] - 0.3).abs() < 1e-9);
        assert!((result["mammal"] - 0.4).abs() < 1e-9);
    }

    #[test]
    fn depth_limit_stops_propagation() {
        let mut graph = ConceptGraph::new();
        for (child, parent) in [("a", "b"), ("b", "c"), ("c", "d"), ("d", "e")] {
            graph
                .add_relation(child, parent, RelationKind::IsA, 1.0, Default::default())
                .unwrap();
        }
        let params = SpreadParams {
            max_depth: 2,
            ..Default::default()
        };
        let result = spread(&graph, &seeds(&["a"]), params).unwrap();
        assert!(result.contains_key("b"));
        assert!(result.contains_key("c"));
        assert!(!result.contains_key("d"));
    }

    #[test]
    fn best_path_wins_over_weaker_path() {
        // Two routes to "goal": a direct weak association and a generalizing
        // edge; the stronger value must survive regardless of arrival order.
        let mut graph = ConceptGraph::new();
        graph.add_concepts(&seeds(&["start", "goal"]));
        graph
            .add_relation("start", "goal", RelationKind::IsA, 2.0, Default::default())
            .unwrap();
        let result = spread(&graph, &seeds(&["start"]), SpreadParams::default()).unwrap();
        // association: 0.5, is-a at weight 2: 0.5*0.8*2 = 0.8
        assert!((result["goal"] - 0.8).abs() < 1e-9);
    }

    #[test]
    fn weight_scales_activation() {
        let mut graph = ConceptGraph::new();
        graph.add_concepts(&seeds(&["a", "b"]));
        graph.add_concepts(&seeds(&["a", "b"]));
        graph.add_concepts(&seeds(&["a", "b"]));
        let result = spread(&graph, &seeds(&["a"]), SpreadParams::default()).unwrap();
        // weight accumulated to 3: 1.0 * 0.5 * 3
        assert!((result["b"] - 1.5).abs() < 1e-9);
    }

    #[test]
    fn result_is_deterministic() {
        let mut graph = taxonomy();
        graph.add_concepts(&seeds(&["cat", "pet", "whiskers"]));
        graph
            .add_relation("cat", "tail", RelationKind::HasA, 1.0, Default::default())
            .unwrap();

        let first = spread(&graph, &seeds(&["cat", "pet"]), SpreadParams::default()).unwrap();
        for _ in 0..10 {
            let again =
                spread(&graph, &seeds(&["cat", "pet"]), SpreadParams::default()).unwrap();
            assert_eq!(first, again);
        }
    }

    #[test]
    fn seed_absent_from_graph_still_reports() {
        let graph = ConceptGraph::new();
        let result = spread(&graph, &seeds(&["phantom"]), SpreadParams::default()).unwrap();
        assert_eq!(result["phantom"], 1.0);
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn empty_seed_set_yields_empty_map() {
        let result = spread(&taxonomy(), &BTreeSet::new(), SpreadParams::default()).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn invalid_params_rejected() {
        let params = SpreadParams {
            decay: 0.0,
            ..Default::default()
        };
        let err = spread(&taxonomy(), &seeds(&["cat"]), params).unwrap_err();
        assert!(err.to_string().starts_with("configuration error"));
    }
}
