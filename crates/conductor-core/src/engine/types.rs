//! Engine types
//!
//! Everything that ends up in a stored [`AgentResult`].

use crate::error::ErrorKind;
use crate::executor::ExecutionOutcome;
use crate::planner::ExecutionPlan;
use crate::validator::ValidationReport;
use chrono::{DateTime, Utc};
use conductor_skills::RoutingDecision;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Engine state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    /// Task accepted
    Received,
    /// Building the plan
    Planning,
    /// Scoring candidates
    Routing,
    /// Paused for an approver
    AwaitingApproval,
    /// Running capabilities
    Executing,
    /// Checking the output
    Validating,
    /// Terminal: finished
    Completed,
    /// Terminal: failed
    Failed,
}

impl std::fmt::Display for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Received => "received",
            Self::Planning => "planning",
            Self::Routing => "routing",
            Self::AwaitingApproval => "awaiting_approval",
            Self::Executing => "executing",
            Self::Validating => "validating",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Terminal (or paused) status of a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Executed; see the validation report for output quality
    Completed,
    /// Paused until approved or rejected
    AwaitingApproval,
    /// No successful execution
    Failed,
}

/// Time spent in one state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRecord {
    /// State
    pub state: EngineState,
    /// Time spent in milliseconds
    pub duration_ms: u64,
}

/// One execution attempt (primary or alternate)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionAttempt {
    /// 1-based attempt number
    pub attempt: usize,
    /// What the executor returned
    pub outcome: ExecutionOutcome,
    /// Wall time of the attempt
    pub duration_ms: u64,
    /// Declared cost of the attempted skill
    pub cost: f64,
}

/// Decision record of a task
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    /// Plan, absent if planning did not run
    pub plan: Option<ExecutionPlan>,
    /// Routing decision, absent if routing did not succeed
    pub routing_decision: Option<RoutingDecision>,
    /// Every attempt, in order
    pub execution_attempts: Vec<ExecutionAttempt>,
    /// Validation report of the successful attempt
    pub validation_report: Option<ValidationReport>,
    /// States visited, in order
    pub stages: Vec<StageRecord>,
    /// Sum of stage durations
    pub latency_ms: u64,
    /// Sum of declared costs of attempted skills
    pub total_cost: f64,
    /// Terminal error, or `validation_incomplete` on completed results
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
    /// Draft artifact written when pausing for approval
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft_artifact: Option<String>,
}

/// Result of a task submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResult {
    /// Task id
    pub task_id: Uuid,
    /// Idempotency key the result is stored under
    pub idempotency_key: String,
    /// Status
    pub status: TaskStatus,
    /// Payload of the successful attempt
    pub result: Option<serde_json::Value>,
    /// Artifacts of the successful attempt
    pub artifacts: Vec<String>,
    /// Decision record
    pub provenance: Provenance,
    /// When the result was assembled
    pub created_at: DateTime<Utc>,
}

impl AgentResult {
    /// Whether the task completed
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// Terminal error kind, if any
    #[must_use]
    pub fn error(&self) -> Option<&ErrorKind> {
        self.provenance.error.as_ref()
    }
}
