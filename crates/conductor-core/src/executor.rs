//! Executor - dispatches a skill to its capability
//!
//! Dispatch never returns an error to the engine: unknown or disabled
//! capabilities, capability errors and panics all become a failed
//! [`ExecutionOutcome`]. Deadlines are enforced by the caller.

use crate::error::ErrorKind;
use crate::task::Task;
use conductor_skills::{Skill, SkillId};
use conductor_tools::{ArtifactStore, CapabilityContext, CapabilityRegistry};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

/// Whether an attempt succeeded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// Capability returned a result
    Success,
    /// Capability failed, timed out or was cancelled
    Failure,
}

/// Result of one execution attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    /// Skill that was attempted
    pub skill_id: SkillId,
    /// Success or failure
    pub status: OutcomeStatus,
    /// Opaque capability payload (`null` on failure)
    pub result: serde_json::Value,
    /// Artifact URIs created by the attempt
    pub artifacts: Vec<String>,
    /// Failure reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
}

impl ExecutionOutcome {
    /// Successful outcome
    #[must_use]
    pub fn success(skill_id: SkillId, result: serde_json::Value, artifacts: Vec<String>) -> Self {
        Self {
            skill_id,
            status: OutcomeStatus::Success,
            result,
            artifacts,
            error: None,
        }
    }

    /// Failed outcome with no artifacts
    #[must_use]
    pub fn failure(skill_id: SkillId, error: ErrorKind) -> Self {
        Self {
            skill_id,
            status: OutcomeStatus::Failure,
            result: serde_json::Value::Null,
            artifacts: Vec::new(),
            error: Some(error),
        }
    }

    /// Whether the attempt succeeded
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}

/// Skill dispatch seam used by the engine
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SkillDispatch: Send + Sync {
    /// Run `skill` for `task`; never fails, failures are in the outcome
    async fn execute(&self, skill: &Skill, task: &Task) -> ExecutionOutcome;
}

/// Aborts the wrapped task when dropped, so a caller-side timeout also
/// stops the capability
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Dispatches skills to registered capabilities
pub struct Executor {
    capabilities: Arc<CapabilityRegistry>,
    artifacts: Arc<dyn ArtifactStore>,
}

impl Executor {
    /// Create an executor
    #[must_use]
    pub fn new(capabilities: Arc<CapabilityRegistry>, artifacts: Arc<dyn ArtifactStore>) -> Self {
        Self {
            capabilities,
            artifacts,
        }
    }

    /// Capability registry
    #[must_use]
    pub fn capabilities(&self) -> &Arc<CapabilityRegistry> {
        &self.capabilities
    }
}

#[async_trait::async_trait]
impl SkillDispatch for Executor {
    #[instrument(
        skip(self, skill, task),
        fields(task_id = %task.id, skill_id = %skill.id, capability = %skill.capability)
    )]
    async fn execute(&self, skill: &Skill, task: &Task) -> ExecutionOutcome {
        let capability = match self.capabilities.resolve(&skill.capability) {
            Ok(capability) => capability,
            Err(e) => {
                warn!(error = %e, "Capability unavailable");
                return ExecutionOutcome::failure(
                    skill.id.clone(),
                    ErrorKind::capability(e.to_string()),
                );
            }
        };

        let ctx = CapabilityContext::new(
            task.id.to_string(),
            task.description.clone(),
            task.context.clone(),
            self.artifacts.clone(),
        );

        // Spawned so a panicking capability is reported instead of unwinding the engine
        let mut handle = AbortOnDrop(tokio::spawn(async move { capability.invoke(&ctx).await }));

        match (&mut handle.0).await {
            Ok(Ok(output)) => {
                debug!(artifacts = output.artifacts.len(), "Capability succeeded");
                ExecutionOutcome::success(skill.id.clone(), output.result, output.artifacts)
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Capability failed");
                ExecutionOutcome::failure(skill.id.clone(), ErrorKind::capability(e.to_string()))
            }
            Err(e) => {
                warn!(error = %e, "Capability task aborted");
                ExecutionOutcome::failure(
                    skill.id.clone(),
                    ErrorKind::capability(format!("capability did not complete: {}", e)),
                )
            }
        }
    }
}
