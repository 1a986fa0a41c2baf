//! Error types for research operations

use thiserror::Error;

/// Result type for research operations
pub type Result<T> = std::result::Result<T, ResearchError>;

/// Errors that can occur while running a research task
#[derive(Error, Debug)]
pub enum ResearchError {
    /// API request failed
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// HTTP error (includes connect and read timeouts)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The model returned something we could not parse into findings
    #[error("Unexpected response format: {0}")]
    UnexpectedResponse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}
