//! Error types for conductor-tools

use thiserror::Error;

/// Capability error type
#[derive(Debug, Error)]
pub enum Error {
    /// Capability not found
    #[error("capability not found: {0}")]
    NotFound(String),

    /// Capability execution failed
    #[error("execution failed: {0}")]
    Execution(String),

    /// Invalid input
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Capability is registered but disabled
    #[error("capability disabled: {0}")]
    Disabled(String),

    /// Artifact not found
    #[error("artifact not found: {0}")]
    ArtifactNotFound(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
