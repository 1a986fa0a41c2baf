//! Error types for edge-core

use thiserror::Error;

/// Result type alias for edge-core
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for domain-level operations
#[derive(Error, Debug)]
pub enum Error {
    /// Generic error message
    #[error("{0}")]
    Generic(String),

    /// A submitted market snapshot failed validation
    #[error("Invalid market snapshot: {0}")]
    InvalidSnapshot(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
