//! Error types for conductor-skills

use thiserror::Error;

/// Skill system error type
#[derive(Debug, Error)]
pub enum Error {
    /// Two catalog entries share a skill id
    #[error("duplicate skill id: {0}")]
    DuplicateSkill(String),

    /// Skill not found
    #[error("skill not found: {0}")]
    SkillNotFound(String),

    /// Catalog could not be parsed or is inconsistent
    #[error("catalog error: {0}")]
    Catalog(String),

    /// Routing weights are negative or do not sum to 1.0
    #[error("invalid routing weights: {0}")]
    InvalidWeights(String),

    /// Benchmark figures out of range
    #[error("invalid benchmark for {skill_id}: {reason}")]
    InvalidBenchmark { skill_id: String, reason: String },

    /// Routing was asked to rank an empty candidate set
    #[error("no candidates to score")]
    NoCandidatesScored,

    /// YAML error
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
