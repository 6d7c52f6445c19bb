mod helpers;

use helpers::concepts;
use mnemo::graph::spread;
use mnemo::{ConceptGraph, RelationKind, SpreadParams};

fn cat_taxonomy() -> ConceptGraph {
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
fn worked_example_cat_feline_mammal() {
    let result = spread(&cat_taxonomy(), &concepts(&["cat"]), SpreadParams::default()).unwrap();

    assert_eq!(result["cat"], 1.0);
    assert!((result["feline"] - 0.4).abs() < 1e-9, "feline = {}", result["feline"]);
    assert!((result["mammal"] - 0.16).abs() < 1e-9, "mammal = {}", result["mammal"]);
}

#[test]
fn spread_is_deterministic_across_repeated_calls() {
    let mut graph = cat_taxonomy();
    graph.add_concepts(&concepts(&["cat", "pet", "sofa"]));
    graph
        .add_relation("cat", "tail", RelationKind::HasA, 2.0, Default::default())
        .unwrap();
    graph
        .add_relation("tabby", "cat", RelationKind::IsA, 1.0, Default::default())
        .unwrap();

    let first = spread(&graph, &concepts(&["cat", "sofa"]), SpreadParams::default()).unwrap();
    for _ in 0..20 {
        let again = spread(&graph, &concepts(&["cat", "sofa"]), SpreadParams::default()).unwrap();
        assert_eq!(first, again);
    }
}

#[test]
fn multi_seed_spread_takes_best_value_per_concept() {
    // "feline" is reachable from the cat seed (0.4) but is itself a seed, so
    // it must stay at 1.0.
    let result = spread(
        &cat_taxonomy(),
        &concepts(&["cat", "feline"]),
        SpreadParams::default(),
    )
    .unwrap();
    assert_eq!(result["cat"], 1.0);
    assert_eq!(result["feline"], 1.0);
    // mammal now reached from feline at full seed strength
    assert!((result["mammal"] - 0.4).abs() < 1e-9);
}

#[test]
fn activation_flows_both_up_and_down() {
    let result = spread(&cat_taxonomy(), &concepts(&["feline"]), SpreadParams::default()).unwrap();
    // up toward mammal at decay*upward, down toward cat at decay*downward
    assert!((result["mammal"] - 0.4).abs() < 1e-9);
    assert!((result["cat"] - 0.3).abs() < 1e-9);
}
