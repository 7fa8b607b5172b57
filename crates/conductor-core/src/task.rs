//! Task model
//!
//! A [`TaskSubmission`] is what a client sends; a [`Task`] is what the engine
//! accepts. Tasks are immutable once accepted.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use conductor_skills::TaskType;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How much the task may do without a human
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutonomyMode {
    /// Skills that require approval pause until approved
    Approver,
    /// Skills run without pausing
    #[default]
    Collaborator,
}

/// Client-supplied task request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSubmission {
    /// Task type (e.g. `ENG`)
    pub task_type: String,
    /// Free-text description
    #[serde(default)]
    pub description: String,
    /// Parameters passed to the capability
    #[serde(default)]
    pub context: serde_json::Map<String, serde_json::Value>,
    /// Routing and execution constraints
    #[serde(default)]
    pub constraints: serde_json::Map<String, serde_json::Value>,
    /// Autonomy mode, collaborator when absent
    #[serde(default)]
    pub autonomy_mode: Option<AutonomyMode>,
    /// Idempotency key (mandatory)
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

impl TaskSubmission {
    /// Create a submission with empty context
    #[must_use]
    pub fn new(task_type: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            task_type: task_type.into(),
            description: description.into(),
            context: serde_json::Map::new(),
            constraints: serde_json::Map::new(),
            autonomy_mode: None,
            idempotency_key: None,
        }
    }

    /// Set the idempotency key
    #[must_use]
    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    /// Set a context parameter
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }

    /// Set a constraint
    #[must_use]
    pub fn with_constraint(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.constraints.insert(key.into(), value);
        self
    }

    /// Set the autonomy mode
    #[must_use]
    pub fn with_autonomy_mode(mut self, mode: AutonomyMode) -> Self {
        self.autonomy_mode = Some(mode);
        self
    }

    /// The trimmed idempotency key, or a client error if absent
    pub fn idempotency_key(&self) -> Result<&str> {
        match self.idempotency_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(Error::MissingIdempotencyKey),
        }
    }
}

/// An accepted task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Engine-assigned id
    pub id: Uuid,
    /// Task type
    pub task_type: TaskType,
    /// Free-text description
    pub description: String,
    /// Parameters passed to the capability
    pub context: serde_json::Map<String, serde_json::Value>,
    /// Routing and execution constraints
    pub constraints: serde_json::Map<String, serde_json::Value>,
    /// Autonomy mode
    pub autonomy_mode: AutonomyMode,
    /// Idempotency key
    pub idempotency_key: String,
    /// Acceptance time
    pub received_at: DateTime<Utc>,
}

impl Task {
    /// Accept a submission, assigning a fresh id
    pub fn accept(submission: TaskSubmission) -> Result<Self> {
        let idempotency_key = submission.idempotency_key()?.to_string();
        let task_type = submission.task_type.trim();
        if task_type.is_empty() {
            return Err(Error::InvalidSubmission(
                "task_type must not be empty".to_string(),
            ));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            task_type: TaskType::new(task_type),
            description: submission.description,
            context: submission.context,
            constraints: submission.constraints,
            autonomy_mode: submission.autonomy_mode.unwrap_or_default(),
            idempotency_key,
            received_at: Utc::now(),
        })
    }
}
