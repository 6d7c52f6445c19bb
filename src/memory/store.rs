//! The memory store: insertion, composite retrieval, lifecycle side effects.
//!
//! [`MemoryStore`] owns the short- and long-term entry lists, the concept
//! graph, and the cluster index. Retrieval combines four signals per entry —
//! cosine similarity, exponential time decay, logarithmic access
//! reinforcement, and concept-activation boost — then mutates decay and
//! access state as a side effect of the call. A store instance is
//! single-caller per call; sharing across threads requires external
//! serialization.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::config::MnemoConfig;
use crate::embedding::cosine_similarity;
use crate::error::{MemoryError, Result};
use crate::graph::activation::{spread, SpreadParams};
use crate::graph::concept::{ConceptGraph, RelationKind};
use crate::memory::cluster::{Clusterer, KMeans};
use crate::memory::snapshot::{self, GraphSnapshot, Snapshot};
use crate::memory::types::MemoryEntry;

/// Counts reported by [`MemoryStore::stats`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StoreStats {
    pub short_term_entries: usize,
    pub long_term_entries: usize,
    pub concepts: usize,
    pub concept_edges: usize,
    pub clusters: usize,
}

/// Concept-graph-backed associative memory store.
#[derive(Debug)]
pub struct MemoryStore {
    dimension: usize,
    config: MnemoConfig,
    short_term: Vec<MemoryEntry>,
    long_term: Vec<MemoryEntry>,
    graph: ConceptGraph,
    clusters: HashMap<usize, Vec<String>>,
    centroids: HashMap<usize, Vec<f32>>,
    clusterer: Box<dyn Clusterer>,
}

impl MemoryStore {
    /// Create an empty store for embeddings of the given dimension.
    pub fn new(dimension: usize) -> Result<Self> {
        Self::with_config(dimension, MnemoConfig::default())
    }

    /// Create an empty store with explicit configuration.
    pub fn with_config(dimension: usize, config: MnemoConfig) -> Result<Self> {
        if dimension == 0 {
            return Err(MemoryError::configuration(
                "embedding dimension must be at least 1",
            ));
        }
        config.validate()?;
        let clusterer = Box::new(KMeans {
            max_iterations: config.clustering.max_iterations,
        });
        Ok(Self {
            dimension,
            config,
            short_term: Vec::new(),
            long_term: Vec::new(),
            graph: ConceptGraph::new(),
            clusters: HashMap::new(),
            centroids: HashMap::new(),
            clusterer,
        })
    }

    /// Create a store and load the snapshot at the configured path.
    ///
    /// A missing or unreadable snapshot degrades to an empty store; a
    /// structurally unparsable one is a fatal error.
    pub fn open(dimension: usize, config: MnemoConfig) -> Result<Self> {
        let path = config.resolved_snapshot_path();
        let mut store = Self::with_config(dimension, config)?;
        if let Some(snapshot) = snapshot::read(&path)? {
            store.apply_snapshot(snapshot)?;
            info!(
                entries = store.short_term.len(),
                concepts = store.graph.node_count(),
                "loaded snapshot from {}",
                path.display()
            );
        }
        Ok(store)
    }

    /// Replace the clustering routine. Any [`Clusterer`] is acceptable.
    pub fn set_clusterer(&mut self, clusterer: Box<dyn Clusterer>) {
        self.clusterer = clusterer;
    }

    // ── Write path ────────────────────────────────────────────────────────

    /// Store a new entry, timestamped now.
    pub fn add_entry(
        &mut self,
        content: Value,
        embedding: Vec<f32>,
        concepts: BTreeSet<String>,
    ) -> Result<&MemoryEntry> {
        self.add_entry_at(content, embedding, concepts, Utc::now())
    }

    /// Store a new entry with an explicit creation time.
    ///
    /// Validates content and embedding dimension, appends to short-term
    /// memory, and registers the concepts (and their pairwise associations)
    /// in the concept graph.
    pub fn add_entry_at(
        &mut self,
        content: Value,
        embedding: Vec<f32>,
        concepts: BTreeSet<String>,
        timestamp: DateTime<Utc>,
    ) -> Result<&MemoryEntry> {
        validate_content(&content)?;
        self.validate_dimension(embedding.len(), "entry embedding")?;

        self.graph.add_concepts(&concepts);

        let entry = MemoryEntry {
            id: uuid::Uuid::now_v7().to_string(),
            content,
            embedding,
            concepts,
            timestamp,
            access_count: 0,
            decay_factor: 1.0,
        };
        debug!(id = %entry.id, concepts = entry.concepts.len(), "stored entry");
        self.short_term.push(entry);

        if let Some(cap) = self.config.storage.max_short_term {
            if self.short_term.len() > cap {
                warn!(
                    len = self.short_term.len(),
                    cap, "short-term memory exceeds configured watermark"
                );
            }
        }
        Ok(self.short_term.last().expect("entry just pushed"))
    }

    // ── Retrieval ─────────────────────────────────────────────────────────

    /// Retrieve entries relevant to a query, most relevant first.
    ///
    /// The pipeline: spread activation over the query concepts, score every
    /// candidate, gate on **raw similarity** against `similarity_threshold`
    /// (relevance and ranking are deliberately separate judgements), sort by
    /// composite score, then apply lifecycle side effects — returned entries
    /// are reinforced, all other short-term entries decay, and an entry
    /// whose access count crosses the promotion threshold is copied into
    /// long-term memory exactly once.
    ///
    /// `exclude_last_n` removes the newest entries from candidacy (they
    /// still take the non-match decay), so an agent can avoid recalling what
    /// it just stored.
    pub fn retrieve(
        &mut self,
        query_embedding: &[f32],
        query_concepts: &BTreeSet<String>,
        similarity_threshold: f64,
        exclude_last_n: usize,
    ) -> Result<Vec<MemoryEntry>> {
        self.validate_dimension(query_embedding.len(), "query embedding")?;
        if similarity_threshold < 0.0 {
            return Err(MemoryError::configuration(format!(
                "similarity_threshold must be non-negative, got {similarity_threshold}"
            )));
        }

        // 1. Concept activation. Empty concepts degrade to similarity-only.
        let activation = if query_concepts.is_empty() {
            HashMap::new()
        } else {
            spread(
                &self.graph,
                query_concepts,
                SpreadParams::from(&self.config.activation),
            )?
        };

        // 2. Score candidates, excluding the newest `exclude_last_n`.
        let now = Utc::now();
        let candidate_count = self.short_term.len().saturating_sub(exclude_last_n);
        let mut scored: Vec<(usize, f64)> = Vec::new();
        for (index, entry) in self.short_term[..candidate_count].iter().enumerate() {
            let Some((similarity, score)) =
                self.score_entry(entry, query_embedding, &activation, now)
            else {
                continue;
            };
            if similarity >= similarity_threshold {
                scored.push((index, score));
            }
        }

        // 3. Rank by composite score, best first; stable for ties.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        let kept: BTreeSet<usize> = scored.iter().map(|(index, _)| *index).collect();

        // 4. Side effects on every short-term entry.
        let reinforcement = self.config.retrieval.reinforcement_factor;
        let non_match_decay = self.config.retrieval.decay_factor;
        let promotion_threshold = self.config.retrieval.promotion_threshold;
        let mut promoted: Vec<MemoryEntry> = Vec::new();
        for (index, entry) in self.short_term.iter_mut().enumerate() {
            if kept.contains(&index) {
                entry.access_count += 1;
                entry.timestamp = now;
                entry.decay_factor *= reinforcement;
                if entry.access_count > promotion_threshold
                    && !self.long_term.iter().any(|e| e.id == entry.id)
                {
                    info!(id = %entry.id, access_count = entry.access_count, "promoting entry to long-term memory");
                    promoted.push(entry.clone());
                }
            } else {
                entry.decay_factor *= non_match_decay;
            }
        }
        self.long_term.extend(promoted);

        // 5. Return post-mutation copies in score order.
        Ok(scored
            .iter()
            .map(|(index, _)| self.short_term[*index].clone())
            .collect())
    }

    /// Raw similarity and composite score for one entry, or `None` if the
    /// entry cannot be scored (corrupt embedding). Scoring failures exclude
    /// the entry, never the whole retrieval.
    fn score_entry(
        &self,
        entry: &MemoryEntry,
        query_embedding: &[f32],
        activation: &HashMap<String, f64>,
        now: DateTime<Utc>,
    ) -> Option<(f64, f64)> {
        if entry.embedding.len() != self.dimension {
            warn!(
                id = %entry.id,
                dims = entry.embedding.len(),
                expected = self.dimension,
                "skipping entry with corrupt embedding"
            );
            return None;
        }
        let similarity = cosine_similarity(query_embedding, &entry.embedding);

        let elapsed = (now - entry.timestamp).num_milliseconds() as f64 / 1000.0;
        let time_decay = (-self.config.retrieval.decay_rate * elapsed.max(0.0)).exp();

        let reinforcement = 1.0 + (1.0 + f64::from(entry.access_count)).ln();

        let concept_boost = if entry.concepts.is_empty() || activation.is_empty() {
            1.0
        } else {
            let total: f64 = entry
                .concepts
                .iter()
                .filter_map(|c| activation.get(c))
                .sum();
            1.0 + (1.0 + total).ln()
        };

        let score = similarity * time_decay * reinforcement * entry.decay_factor * concept_boost;
        if !score.is_finite() {
            warn!(id = %entry.id, "skipping entry with non-finite score");
            return None;
        }
        Some((similarity, score))
    }

    /// Entries whose structured content contains every key/value pair of
    /// `query`. Read-only; no decay or reinforcement.
    pub fn exact_match(&self, query: &serde_json::Map<String, Value>) -> Vec<MemoryEntry> {
        self.short_term
            .iter()
            .filter(|entry| entry.content_matches(query))
            .cloned()
            .collect()
    }

    /// Look up an entry by id.
    pub fn entry(&self, id: &str) -> Result<&MemoryEntry> {
        self.short_term
            .iter()
            .find(|entry| entry.id == id)
            .ok_or_else(|| MemoryError::not_found(format!("entry not in store: {id}")))
    }

    // ── Concept graph surface ─────────────────────────────────────────────

    /// Add or strengthen a typed relation between two concepts.
    pub fn add_relation(
        &mut self,
        child: &str,
        parent: &str,
        kind: RelationKind,
        weight: f64,
        metadata: serde_json::Map<String, Value>,
    ) -> Result<()> {
        self.graph.add_relation(child, parent, kind, weight, metadata)
    }

    /// Transitive generalizations of a concept. The concept itself must exist.
    pub fn get_ancestors(&self, concept: &str, kind: RelationKind) -> Result<BTreeSet<String>> {
        if !self.graph.contains(concept) {
            return Err(MemoryError::not_found(format!(
                "concept not in graph: {concept}"
            )));
        }
        Ok(self.graph.ancestors(concept, kind))
    }

    /// Transitive specializations of a concept. The concept itself must exist.
    pub fn get_descendants(&self, concept: &str, kind: RelationKind) -> Result<BTreeSet<String>> {
        if !self.graph.contains(concept) {
            return Err(MemoryError::not_found(format!(
                "concept not in graph: {concept}"
            )));
        }
        Ok(self.graph.descendants(concept, kind))
    }

    /// Read-only access to the concept graph.
    pub fn graph(&self) -> &ConceptGraph {
        &self.graph
    }

    // ── Cluster fallback ──────────────────────────────────────────────────

    /// Re-partition all entry embeddings into `min(max_clusters, n)` groups.
    ///
    /// A no-op (not an error) for fewer than two entries. Entries whose
    /// embedding does not match the store dimension are skipped with a
    /// warning.
    pub fn rebuild_clusters(&mut self) -> Result<()> {
        let mut ids: Vec<&str> = Vec::new();
        let mut vectors: Vec<Vec<f32>> = Vec::new();
        for entry in &self.short_term {
            if entry.embedding.len() != self.dimension {
                warn!(id = %entry.id, "skipping entry with corrupt embedding in clustering");
                continue;
            }
            ids.push(&entry.id);
            vectors.push(entry.embedding.clone());
        }
        if vectors.len() < 2 {
            return Ok(());
        }

        let k = self.config.clustering.max_clusters.min(vectors.len());
        let clustering = self.clusterer.cluster(&vectors, k)?;

        let mut clusters: HashMap<usize, Vec<String>> = HashMap::new();
        for (id, &cluster) in ids.iter().zip(clustering.assignments.iter()) {
            clusters.entry(cluster).or_default().push(id.to_string());
        }
        let centroids: HashMap<usize, Vec<f32>> =
            clustering.centroids.into_iter().enumerate().collect();

        debug!(clusters = centroids.len(), entries = ids.len(), "rebuilt cluster index");
        self.clusters = clusters;
        self.centroids = centroids;
        Ok(())
    }

    /// Coarse retrieval through the cluster index.
    ///
    /// Picks the centroid most similar to the query and returns that
    /// cluster's members ranked by similarity to the query. Read-only — a
    /// supplement for when graph and activation signal is weak, so it does
    /// not reinforce or decay anything.
    pub fn retrieve_by_cluster(&self, query_embedding: &[f32]) -> Result<Vec<MemoryEntry>> {
        self.validate_dimension(query_embedding.len(), "query embedding")?;

        let Some((best_cluster, _)) = self
            .centroids
            .iter()
            .map(|(cluster, centroid)| {
                (*cluster, cosine_similarity(query_embedding, centroid))
            })
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        else {
            return Ok(Vec::new());
        };

        let member_ids = self.clusters.get(&best_cluster).cloned().unwrap_or_default();
        let mut members: Vec<(MemoryEntry, f64)> = self
            .short_term
            .iter()
            .filter(|entry| member_ids.contains(&entry.id))
            .filter_map(|entry| {
                // A loaded cluster may name an entry whose embedding is
                // corrupt; skip it like the scoring path does.
                if entry.embedding.len() != self.dimension {
                    warn!(id = %entry.id, "skipping cluster member with corrupt embedding");
                    return None;
                }
                let similarity = cosine_similarity(query_embedding, &entry.embedding);
                Some((entry.clone(), similarity))
            })
            .collect();
        members.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        Ok(members.into_iter().map(|(entry, _)| entry).collect())
    }

    // ── Persistence ───────────────────────────────────────────────────────

    /// Save a snapshot to the configured path.
    pub fn save(&self) -> Result<()> {
        self.save_snapshot(self.config.resolved_snapshot_path())
    }

    /// Save a snapshot to an explicit path, all-or-nothing.
    pub fn save_snapshot(&self, path: impl AsRef<Path>) -> Result<()> {
        let snapshot = self.to_snapshot()?;
        snapshot::write(path, &snapshot)
    }

    /// Replace the store's state with the snapshot at `path`.
    ///
    /// Same degradation rules as [`MemoryStore::open`]: a missing or
    /// unreadable file resets to empty, an unparsable one is fatal and
    /// leaves the store untouched.
    pub fn load_snapshot(&mut self, path: impl AsRef<Path>) -> Result<()> {
        match snapshot::read(path)? {
            Some(snapshot) => self.apply_snapshot(snapshot),
            None => {
                self.short_term.clear();
                self.long_term.clear();
                self.graph = ConceptGraph::new();
                self.clusters.clear();
                self.centroids.clear();
                Ok(())
            }
        }
    }

    fn to_snapshot(&self) -> Result<Snapshot> {
        let serialize_entries = |entries: &[MemoryEntry]| -> Result<Vec<Value>> {
            entries
                .iter()
                .map(|entry| {
                    serde_json::to_value(entry).map_err(|e| {
                        MemoryError::persistence_with_source("failed to serialize entry", e)
                    })
                })
                .collect()
        };

        let mut nodes: Vec<String> = self.graph.nodes().map(str::to_string).collect();
        nodes.sort();
        let mut edges: Vec<_> = self.graph.edges().cloned().collect();
        edges.sort_by(|a, b| {
            (a.source.as_str(), a.target.as_str(), a.kind.as_str())
                .cmp(&(b.source.as_str(), b.target.as_str(), b.kind.as_str()))
        });

        Ok(Snapshot {
            short_term: serialize_entries(&self.short_term)?,
            long_term: serialize_entries(&self.long_term)?,
            concept_graph: GraphSnapshot { nodes, edges },
            clusters: self
                .clusters
                .iter()
                .map(|(cluster, ids)| (cluster.to_string(), ids.clone()))
                .collect(),
            cluster_centroids: self
                .centroids
                .iter()
                .map(|(cluster, centroid)| (cluster.to_string(), centroid.clone()))
                .collect(),
        })
    }

    fn apply_snapshot(&mut self, snapshot: Snapshot) -> Result<()> {
        self.short_term = snapshot::parse_entries(&snapshot.short_term, "short_term");
        self.long_term = snapshot::parse_entries(&snapshot.long_term, "long_term");

        let mut graph = ConceptGraph::new();
        for node in &snapshot.concept_graph.nodes {
            graph.ensure_node(node);
        }
        for edge in snapshot.concept_graph.edges {
            // Each directed edge appears once in the snapshot, so inserting
            // it once restores the accumulated weight exactly.
            graph.add_relation(
                &edge.source,
                &edge.target,
                edge.kind,
                edge.weight,
                edge.metadata,
            )?;
        }
        // Entry concepts must exist as nodes even if the snapshot's node
        // list was trimmed.
        for entry in self.short_term.iter().chain(self.long_term.iter()) {
            for concept in &entry.concepts {
                graph.ensure_node(concept);
            }
        }
        self.graph = graph;

        self.clusters.clear();
        self.centroids.clear();
        for (key, ids) in snapshot.clusters {
            match key.parse::<usize>() {
                Ok(cluster) => {
                    self.clusters.insert(cluster, ids);
                }
                Err(_) => warn!("dropping cluster with non-numeric id {key:?}"),
            }
        }
        for (key, centroid) in snapshot.cluster_centroids {
            match key.parse::<usize>() {
                Ok(cluster) => {
                    self.centroids.insert(cluster, centroid);
                }
                Err(_) => warn!("dropping centroid with non-numeric id {key:?}"),
            }
        }
        Ok(())
    }

    // ── Introspection ─────────────────────────────────────────────────────

    /// Entry counts and index sizes.
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            short_term_entries: self.short_term.len(),
            long_term_entries: self.long_term.len(),
            concepts: self.graph.node_count(),
            concept_edges: self.graph.edge_count(),
            clusters: self.centroids.len(),
        }
    }

    /// The live working set, in insertion order.
    pub fn short_term(&self) -> &[MemoryEntry] {
        &self.short_term
    }

    /// Promoted entries, in promotion order.
    pub fn long_term(&self) -> &[MemoryEntry] {
        &self.long_term
    }

    /// The embedding dimension this store accepts.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    fn validate_dimension(&self, got: usize, what: &str) -> Result<()> {
        if got != self.dimension {
            return Err(MemoryError::validation(format!(
                "{what} has {got} dimensions, store expects {}",
                self.dimension
            )));
        }
        Ok(())
    }
}

fn validate_content(content: &Value) -> Result<()> {
    let empty = match content {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    };
    if empty {
        return Err(MemoryError::validation("content must not be empty"));
    }
    Ok(())
}
