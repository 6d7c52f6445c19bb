//! Snapshot (de)serialization at the persistence boundary.
//!
//! The live store never serializes on mutation; a snapshot is produced only
//! on an explicit save and consumed once at construction. The loader is
//! tolerant: missing top-level sections are treated as empty and an entry
//! missing `id` or `content` is rejected with a warning, but a structurally
//! unparsable document is fatal.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

use crate::error::{MemoryError, Result};
use crate::graph::concept::ConceptEdge;
use crate::memory::types::MemoryEntry;

/// On-disk snapshot of a whole store.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Short-term entries, kept raw so one bad entry cannot sink the load.
    #[serde(default)]
    pub short_term: Vec<serde_json::Value>,
    /// Long-term (promoted) entries, same shape as `short_term`.
    #[serde(default)]
    pub long_term: Vec<serde_json::Value>,
    #[serde(default)]
    pub concept_graph: GraphSnapshot,
    /// Cluster id → member entry ids. JSON object keys are strings.
    #[serde(default)]
    pub clusters: HashMap<String, Vec<String>>,
    /// Cluster id → centroid vector.
    #[serde(default)]
    pub cluster_centroids: HashMap<String, Vec<f32>>,
}

/// Serialized concept graph: node list plus flat edge list.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub nodes: Vec<String>,
    #[serde(default)]
    pub edges: Vec<ConceptEdge>,
}

/// Read a snapshot from disk.
///
/// A missing or unreadable file degrades to `None` (the caller starts
/// empty); a file that is not valid JSON in the top-level shape is a fatal
/// persistence error.
pub fn read(path: impl AsRef<Path>) -> Result<Option<Snapshot>> {
    let path = path.as_ref();
    if !path.exists() {
        info!("no snapshot at {}, starting empty", path.display());
        return Ok(None);
    }
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            warn!("failed to read snapshot {}: {e}, starting empty", path.display());
            return Ok(None);
        }
    };
    let snapshot = serde_json::from_str(&contents).map_err(|e| {
        MemoryError::persistence_with_source(
            format!("snapshot {} is unparsable", path.display()),
            e,
        )
    })?;
    Ok(Some(snapshot))
}

/// Write a snapshot to disk, all-or-nothing.
///
/// Serializes fully, writes a sibling temp file, then renames over the
/// target so a failed save never leaves a truncated snapshot behind.
pub fn write(path: impl AsRef<Path>, snapshot: &Snapshot) -> Result<()> {
    let path = path.as_ref();
    let contents = serde_json::to_string(snapshot)
        .map_err(|e| MemoryError::persistence_with_source("failed to serialize snapshot", e))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                MemoryError::persistence_with_source(
                    format!("failed to create snapshot dir {}", parent.display()),
                    e,
                )
            })?;
        }
    }

    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, contents).map_err(|e| {
        MemoryError::persistence_with_source(
            format!("failed to write snapshot temp file {}", tmp.display()),
            e,
        )
    })?;
    std::fs::rename(&tmp, path).map_err(|e| {
        MemoryError::persistence_with_source(
            format!("failed to move snapshot into place at {}", path.display()),
            e,
        )
    })?;
    Ok(())
}

/// Parse raw entry values, dropping any entry missing `id` or `content`.
pub fn parse_entries(raw: &[serde_json::Value], section: &str) -> Vec<MemoryEntry> {
    let mut entries = Vec::with_capacity(raw.len());
    for value in raw {
        match serde_json::from_value::<MemoryEntry>(value.clone()) {
            Ok(entry) => entries.push(entry),
            Err(e) => warn!("dropping malformed {section} entry: {e}"),
        }
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_object_parses_to_empty_snapshot() {
        let snapshot: Snapshot = serde_json::from_str("{}").unwrap();
        assert!(snapshot.short_term.is_empty());
        assert!(snapshot.long_term.is_empty());
        assert!(snapshot.concept_graph.nodes.is_empty());
        assert!(snapshot.clusters.is_empty());
    }

    #[test]
    fn entry_missing_content_is_dropped() {
        let raw = vec![
            json!({
                "id": "0192d5c0-0000-7000-8000-000000000001",
                "content": "good entry",
                "embedding": [1.0, 0.0],
                "timestamp": "2026-01-01T00:00:00Z",
            }),
            json!({
                "id": "0192d5c0-0000-7000-8000-000000000002",
                "embedding": [0.0, 1.0],
            }),
            json!({ "content": "entry without id" }),
        ];
        let entries = parse_entries(&raw, "short_term");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].content, json!("good entry"));
    }

    #[test]
    fn missing_file_degrades_to_none() {
        let dir = tempfile::tempdir().unwrap();
        let result = read(dir.path().join("absent.json")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn unparsable_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = read(&path).unwrap_err();
        assert!(err.to_string().contains("unparsable"));
    }

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("memory.json");

        let snapshot = Snapshot {
            short_term: vec![json!({
                "id": "0192d5c0-0000-7000-8000-000000000001",
                "content": {"tool": "search"},
                "embedding": [1.0, 0.0],
                "concepts": ["search"],
                "timestamp": "2026-01-01T00:00:00Z",
                "access_count": 3,
                "decay_factor": 1.21,
            })],
            ..Default::default()
        };
        write(&path, &snapshot).unwrap();

        let loaded = read(&path).unwrap().unwrap();
        assert_eq!(loaded.short_term.len(), 1);
        let entries = parse_entries(&loaded.short_term, "short_term");
        assert_eq!(entries[0].access_count, 3);
        assert!((entries[0].decay_factor - 1.21).abs() < 1e-12);
        // no temp file left behind
        assert!(!path.with_extension("json.tmp").exists());
    }
}
