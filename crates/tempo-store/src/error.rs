//! Error types for the persistence layer.
//!
//! All errors are propagated via [`StoreError`] which wraps the underlying
//! [`fred`] and `serde_json` errors with context about what failed.

/// Errors that can occur in the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A `Dragonfly`/Redis operation failed.
    #[error("Dragonfly error: {0}")]
    Dragonfly(#[from] fred::error::Error),

    /// A stored blob could not be serialized or deserialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A record that must be unique already exists.
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// A configuration error (bad URL, unsupported backend).
    #[error("Configuration error: {0}")]
    Config(String),
}
