//! Result assembly
//!
//! Terminal results are assembled here, persisted under the task's
//! idempotency key and announced on the event bus. Cancelled results are the
//! exception: their key is released instead.

use crate::error::{ErrorKind, Result};
use crate::event_bus::EngineEvent;
use crate::executor::ExecutionOutcome;
use crate::task::Task;
use chrono::Utc;
use tracing::{error, info, warn};

use super::clock::StageClock;
use super::core::Engine;
use super::types::{AgentResult, EngineState, Provenance, TaskStatus};

/// Build a result, deriving latency and cost from the provenance
pub(crate) fn assemble(
    task: &Task,
    status: TaskStatus,
    result: Option<serde_json::Value>,
    artifacts: Vec<String>,
    mut provenance: Provenance,
) -> AgentResult {
    provenance.latency_ms = provenance.stages.iter().map(|s| s.duration_ms).sum();
    provenance.total_cost = provenance.execution_attempts.iter().map(|a| a.cost).sum();

    AgentResult {
        task_id: task.id,
        idempotency_key: task.idempotency_key.clone(),
        status,
        result,
        artifacts,
        provenance,
        created_at: Utc::now(),
    }
}

impl Engine {
    pub(crate) async fn persist(&self, result: &AgentResult) -> Result<()> {
        self.store
            .put(&result.idempotency_key, result)
            .await
            .map_err(|e| {
                error!(task_id = %result.task_id, error = %e, "Failed to store result");
                e
            })
    }

    pub(crate) async fn complete(
        &self,
        task: &Task,
        clock: StageClock,
        mut provenance: Provenance,
        outcome: ExecutionOutcome,
    ) -> Result<AgentResult> {
        provenance.stages = clock.finish(EngineState::Completed);
        let validation_passed = provenance
            .validation_report
            .as_ref()
            .is_some_and(|r| r.aggregate_passed);

        let result = assemble(
            task,
            TaskStatus::Completed,
            Some(outcome.result),
            outcome.artifacts,
            provenance,
        );
        self.persist(&result).await?;

        info!(
            task_id = %task.id,
            skill_id = %outcome.skill_id,
            validation_passed,
            latency_ms = result.provenance.latency_ms,
            total_cost = result.provenance.total_cost,
            "Task completed"
        );
        self.emit(EngineEvent::TaskCompleted {
            task_id: task.id,
            validation_passed,
        });
        Ok(result)
    }

    pub(crate) async fn fail(
        &self,
        task: &Task,
        clock: StageClock,
        mut provenance: Provenance,
        kind: ErrorKind,
    ) -> Result<AgentResult> {
        provenance.stages = clock.finish(EngineState::Failed);
        provenance.error = Some(kind.clone());

        let result = assemble(task, TaskStatus::Failed, None, Vec::new(), provenance);
        self.persist(&result).await?;

        warn!(task_id = %task.id, error = %kind, "Task failed");
        self.emit(EngineEvent::TaskFailed {
            task_id: task.id,
            error: kind.to_string(),
        });
        Ok(result)
    }

    pub(crate) async fn cancelled(
        &self,
        task: &Task,
        clock: StageClock,
        mut provenance: Provenance,
    ) -> Result<AgentResult> {
        provenance.stages = clock.finish(EngineState::Failed);
        provenance.error = Some(ErrorKind::Cancelled);

        let result = assemble(task, TaskStatus::Failed, None, Vec::new(), provenance);
        self.store.release(&task.idempotency_key).await?;

        warn!(task_id = %task.id, "Task cancelled");
        self.emit(EngineEvent::TaskCancelled { task_id: task.id });
        Ok(result)
    }
}
