//! Error types for the orchestration engine
//!
//! Individual research-task failures are not errors at this level: they are
//! absorbed into [`TaskState::Failed`](crate::runner::TaskState). These
//! variants cover orchestration-level faults only.

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Orchestration-level faults
#[derive(Error, Debug)]
pub enum EngineError {
    /// The cache backend failed
    #[error("Cache backend error: {0}")]
    Cache(String),

    /// The snapshot failed validation before any task launched
    #[error(transparent)]
    InvalidSnapshot(#[from] edge_core::Error),

    /// An internal invariant was violated (e.g. a runner vanished without
    /// settling)
    #[error("Internal error: {0}")]
    Internal(String),
}
