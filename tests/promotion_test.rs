mod helpers;

use std::collections::BTreeSet;

use helpers::{test_embedding, test_store, test_store_with};
use serde_json::json;

#[test]
fn promotion_fires_on_the_call_that_crosses_the_threshold() {
    let mut store = test_store();
    store
        .add_entry(json!("frequently recalled"), test_embedding(0), BTreeSet::new())
        .unwrap();

    for round in 1..=10 {
        store
            .retrieve(&test_embedding(0), &BTreeSet::new(), 0.5, 0)
            .unwrap();
        assert!(
            store.long_term().is_empty(),
            "no promotion at access_count {round}"
        );
    }

    // access_count 10 → 11 crosses the threshold on this call.
    store
        .retrieve(&test_embedding(0), &BTreeSet::new(), 0.5, 0)
        .unwrap();
    assert_eq!(store.long_term().len(), 1);
    assert_eq!(store.short_term()[0].access_count, 11);
}

#[test]
fn promotion_is_a_copy_and_never_repeats() {
    let mut store = test_store();
    store
        .add_entry(json!("sticky"), test_embedding(0), BTreeSet::new())
        .unwrap();

    for _ in 0..15 {
        store
            .retrieve(&test_embedding(0), &BTreeSet::new(), 0.5, 0)
            .unwrap();
    }

    assert_eq!(store.long_term().len(), 1, "promoted exactly once");
    assert_eq!(store.short_term().len(), 1, "promotion never removes");
    assert_eq!(store.long_term()[0].id, store.short_term()[0].id);
}

#[test]
fn promotion_threshold_is_configurable() {
    let mut store = test_store_with(|config| config.retrieval.promotion_threshold = 2);
    store
        .add_entry(json!("quick climber"), test_embedding(0), BTreeSet::new())
        .unwrap();

    store
        .retrieve(&test_embedding(0), &BTreeSet::new(), 0.5, 0)
        .unwrap();
    store
        .retrieve(&test_embedding(0), &BTreeSet::new(), 0.5, 0)
        .unwrap();
    assert!(store.long_term().is_empty());

    store
        .retrieve(&test_embedding(0), &BTreeSet::new(), 0.5, 0)
        .unwrap();
    assert_eq!(store.long_term().len(), 1);
}

#[test]
fn unmatched_entries_only_decay_and_never_promote() {
    let mut store = test_store();
    store
        .add_entry(json!("never matched"), test_embedding(7), BTreeSet::new())
        .unwrap();

    for _ in 0..20 {
        store
            .retrieve(&test_embedding(0), &BTreeSet::new(), 0.5, 0)
            .unwrap();
    }

    let entry = &store.short_term()[0];
    assert_eq!(entry.access_count, 0);
    assert!(store.long_term().is_empty());
    assert!((entry.decay_factor - 0.9f64.powi(20)).abs() < 1e-12);
    assert!(entry.decay_factor > 0.0, "decay is asymptotic, never zero");
}
