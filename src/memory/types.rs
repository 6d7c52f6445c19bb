//! Core memory record definition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A single remembered interaction.
///
/// Entries live in short-term memory from creation onward; a frequently
/// retrieved entry is additionally copied into long-term memory once its
/// access count crosses the promotion threshold. The engine never deletes
/// an entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// UUID v7 (time-sortable) identifier.
    pub id: String,
    /// Opaque payload — a JSON string or a structured object. Structured
    /// objects are queryable through exact matching.
    pub content: serde_json::Value,
    /// Fixed-dimension embedding of the content.
    #[serde(default)]
    pub embedding: Vec<f32>,
    /// Concept labels extracted from the content.
    #[serde(default)]
    pub concepts: BTreeSet<String>,
    /// Creation time, refreshed to the retrieval time on every match.
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    /// Number of retrievals that returned this entry. Monotone.
    #[serde(default)]
    pub access_count: u32,
    /// Relevance multiplier: strengthened ×1.1 on each match, weakened ×0.9
    /// otherwise. Strictly positive, asymptotic, never zero.
    #[serde(default = "default_decay_factor")]
    pub decay_factor: f64,
}

fn default_decay_factor() -> f64 {
    1.0
}

impl MemoryEntry {
    /// Whether this entry's structured content contains every key/value pair
    /// of `query`. String content never matches.
    pub fn content_matches(&self, query: &serde_json::Map<String, serde_json::Value>) -> bool {
        match self.content.as_object() {
            Some(object) => query
                .iter()
                .all(|(key, value)| object.get(key) == Some(value)),
            None => false,
        }
    }
}
