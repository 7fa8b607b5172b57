//! Error types for conductor-core
//!
//! Two layers of error exist here:
//! - [`Error`]: operational failures returned from engine calls (bad input,
//!   unknown task, store outage).
//! - [`ErrorKind`]: the decision-level error recorded in a result's
//!   provenance. A task that fails with an `ErrorKind` is still a successful
//!   engine call that returns an `AgentResult`.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Submission carried no idempotency key
    #[error("idempotency key is required")]
    MissingIdempotencyKey,

    /// Submission is malformed
    #[error("invalid submission: {0}")]
    InvalidSubmission(String),

    /// No task with this id is known
    #[error("task not found: {0}")]
    TaskNotFound(Uuid),

    /// Task exists but is not paused for approval
    #[error("task {0} is not awaiting approval")]
    NotAwaitingApproval(Uuid),

    /// Another submission holds the key and did not finish in time
    #[error("duplicate submission still in progress for key {key}")]
    DuplicateSubmission {
        /// Contended idempotency key
        key: String,
    },

    /// Idempotency store failure (Redis, corrupt entry, ...)
    #[error("store error: {0}")]
    Store(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Skill catalog error
    #[error("skill error: {0}")]
    Skills(#[from] conductor_skills::Error),

    /// Capability or artifact error
    #[error("tool error: {0}")]
    Tools(#[from] conductor_tools::Error),
}

impl Error {
    /// Whether the caller, not the engine, is at fault
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingIdempotencyKey
                | Self::InvalidSubmission(_)
                | Self::TaskNotFound(_)
                | Self::NotAwaitingApproval(_)
                | Self::DuplicateSubmission { .. }
        )
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Decision-level error recorded in provenance
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ErrorKind {
    /// No enabled skill serves the task type
    #[error("unknown task type")]
    UnknownTaskType,

    /// Routing had nothing to rank
    #[error("no candidates scored")]
    NoCandidatesScored,

    /// An attempt exceeded its deadline
    #[error("timeout")]
    Timeout,

    /// The capability reported an error
    #[error("capability failure: {detail}")]
    CapabilityFailure {
        /// What went wrong
        detail: String,
    },

    /// Validation did not finish within its deadline
    #[error("validation incomplete")]
    ValidationIncomplete,

    /// The task was cancelled
    #[error("cancelled")]
    Cancelled,

    /// Lost an idempotency race
    #[error("duplicate submission")]
    DuplicateSubmission,

    /// An approver rejected the task
    #[error("approval rejected")]
    ApprovalRejected {
        /// Reason given by the approver
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

impl ErrorKind {
    /// Build a capability failure
    #[must_use]
    pub fn capability(detail: impl Into<String>) -> Self {
        Self::CapabilityFailure {
            detail: detail.into(),
        }
    }
}
