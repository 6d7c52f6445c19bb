use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{MemoryError, Result};

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MnemoConfig {
    pub storage: StorageConfig,
    pub retrieval: RetrievalConfig,
    pub activation: ActivationConfig,
    pub clustering: ClusteringConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    /// Path of the JSON snapshot read at construction and written on save.
    pub snapshot_path: String,
    /// Log level for hosts that install a subscriber from config.
    pub log_level: String,
    /// Optional soft capacity for short-term memory. The engine never evicts;
    /// crossing this watermark only logs a warning. `None` disables the check.
    pub max_short_term: Option<usize>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Minimum raw cosine similarity for an entry to be returned at all.
    pub similarity_threshold: f64,
    /// Exponential time-decay rate per second of entry age.
    pub decay_rate: f64,
    /// Multiplier applied to `decay_factor` of every entry a retrieve returns.
    pub reinforcement_factor: f64,
    /// Multiplier applied to `decay_factor` of every short-term entry a
    /// retrieve does not return.
    pub decay_factor: f64,
    /// Access count an entry must exceed to be promoted into long-term memory.
    pub promotion_threshold: u32,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ActivationConfig {
    /// Base propagation factor per hop.
    pub decay: f64,
    /// Extra factor for edges that flow toward generalization (is-a,
    /// part-of, instance-of).
    pub upward: f64,
    /// Extra factor for every other edge kind and for reverse
    /// specialization hops.
    pub downward: f64,
    /// Maximum number of hops from any seed.
    pub max_depth: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Upper bound on cluster count; the effective k is `min(max_clusters, n)`.
    pub max_clusters: usize,
    /// Lloyd-iteration cap for a single rebuild.
    pub max_iterations: usize,
}

impl Default for MnemoConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            retrieval: RetrievalConfig::default(),
            activation: ActivationConfig::default(),
            clustering: ClusteringConfig::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let snapshot_path = default_mnemo_dir()
            .join("memory.json")
            .to_string_lossy()
            .into_owned();
        Self {
            snapshot_path,
            log_level: "info".into(),
            max_short_term: None,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.4,
            decay_rate: 1e-4,
            reinforcement_factor: 1.1,
            decay_factor: 0.9,
            promotion_threshold: 10,
        }
    }
}

impl Default for ActivationConfig {
    fn default() -> Self {
        Self {
            decay: 0.5,
            upward: 0.8,
            downward: 0.6,
            max_depth: 3,
        }
    }
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            max_clusters: 10,
            max_iterations: 100,
        }
    }
}

/// Returns `~/.mnemo/`
pub fn default_mnemo_dir() -> PathBuf {
    dirs::home_dir()
        .expect("home directory must exist")
        .join(".mnemo")
}

/// Returns the default config file path: `~/.mnemo/config.toml`
pub fn default_config_path() -> PathBuf {
    default_mnemo_dir().join("config.toml")
}

impl MnemoConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides and validate.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path).map_err(|e| {
                MemoryError::persistence_with_source("failed to read config file", e)
            })?;
            toml::from_str(&contents).map_err(|e| {
                MemoryError::persistence_with_source("failed to parse config TOML", e)
            })?
        } else {
            info!("no config file at {}, using defaults", path.display());
            MnemoConfig::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides (MNEMO_SNAPSHOT, MNEMO_LOG_LEVEL).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("MNEMO_SNAPSHOT") {
            self.storage.snapshot_path = val;
        }
        if let Ok(val) = std::env::var("MNEMO_LOG_LEVEL") {
            self.storage.log_level = val;
        }
    }

    /// Reject out-of-range knobs before any store is built with them.
    ///
    /// The threshold must be non-negative; the multiplicative factors and the
    /// time-decay rate must be strictly positive, since they feed scores and
    /// `decay_factor` state that must never reach zero.
    pub fn validate(&self) -> Result<()> {
        if self.retrieval.similarity_threshold < 0.0 {
            return Err(MemoryError::configuration(format!(
                "similarity_threshold must be non-negative, got {}",
                self.retrieval.similarity_threshold
            )));
        }
        for (name, value) in [
            ("retrieval.decay_rate", self.retrieval.decay_rate),
            (
                "retrieval.reinforcement_factor",
                self.retrieval.reinforcement_factor,
            ),
            ("retrieval.decay_factor", self.retrieval.decay_factor),
            ("activation.decay", self.activation.decay),
            ("activation.upward", self.activation.upward),
            ("activation.downward", self.activation.downward),
        ] {
            if value <= 0.0 {
                return Err(MemoryError::configuration(format!(
                    "{name} must be strictly positive, got {value}"
                )));
            }
        }
        if self.activation.max_depth == 0 {
            return Err(MemoryError::configuration(
                "activation.max_depth must be at least 1",
            ));
        }
        if self.clustering.max_clusters == 0 {
            return Err(MemoryError::configuration(
                "clustering.max_clusters must be at least 1",
            ));
        }
        Ok(())
    }

    /// Resolve the snapshot path, expanding `~` if needed.
    pub fn resolved_snapshot_path(&self) -> PathBuf {
        expand_tilde(&self.storage.snapshot_path)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .expect("home directory must exist")
            .join(rest)
    } else {
        PathBuf::from(path)
    }
}
