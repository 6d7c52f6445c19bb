//! Error types for the memory engine.

use thiserror::Error;

/// Result type alias using the engine's [`MemoryError`].
pub type Result<T> = std::result::Result<T, MemoryError>;

/// Errors that can occur during memory-engine operations.
#[derive(Error, Debug)]
pub enum MemoryError {
    /// Malformed input rejected at the call boundary — an embedding with the
    /// wrong dimension, empty content, and the like.
    #[error("validation error: {0}")]
    Validation(String),

    /// A direct lookup referenced a concept or entry that does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Snapshot I/O failed or the snapshot document is structurally unparsable.
    #[error("persistence error: {message}")]
    Persistence {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A configuration knob is out of range: negative threshold, non-positive
    /// decay or activation factor.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl MemoryError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a persistence error without an underlying source.
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
            source: None,
        }
    }

    /// Create a persistence error wrapping an underlying I/O or parse error.
    pub fn persistence_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Persistence {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}
