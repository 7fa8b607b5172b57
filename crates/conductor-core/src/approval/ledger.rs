use crate::engine::{EngineState, StageClock, StageRecord};
use crate::error::Result;
use crate::idempotency::IdempotencyStore;
use crate::planner::ExecutionPlan;
use crate::task::Task;
use chrono::{DateTime, Utc};
use conductor_skills::{RoutingDecision, SkillId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// A task paused before execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingApproval {
    /// The paused task
    pub task: Task,
    /// Its plan
    pub plan: ExecutionPlan,
    /// Decision to resume with
    pub decision: RoutingDecision,
    /// States left before the pause
    pub stages: Vec<StageRecord>,
    /// Draft artifact written at pause time
    pub draft_artifact: Option<String>,
    /// When the task paused
    pub created_at: DateTime<Utc>,
}

impl PendingApproval {
    /// Summary for listings
    #[must_use]
    pub fn summary(&self) -> PendingSummary {
        PendingSummary {
            task_id: self.task.id,
            skill_id: self.decision.primary.skill_id.clone(),
            idempotency_key: self.task.idempotency_key.clone(),
            created_at: self.created_at,
        }
    }

    /// Stage clock positioned in `awaiting_approval` since the pause
    #[must_use]
    pub fn resume_clock(&self) -> StageClock {
        let paused_for = (Utc::now() - self.created_at).to_std().unwrap_or_default();
        StageClock::resume(self.stages.clone(), EngineState::AwaitingApproval, paused_for)
    }
}

/// Listing entry for a paused task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingSummary {
    /// Task id
    pub task_id: Uuid,
    /// Skill awaiting approval
    pub skill_id: SkillId,
    /// Idempotency key
    pub idempotency_key: String,
    /// When the task paused
    pub created_at: DateTime<Utc>,
}

/// Paused tasks keyed by task id, kept in the idempotency store
#[derive(Clone)]
pub struct ApprovalLedger {
    store: Arc<dyn IdempotencyStore>,
}

impl ApprovalLedger {
    /// Ledger over `store`
    #[must_use]
    pub fn new(store: Arc<dyn IdempotencyStore>) -> Self {
        Self { store }
    }

    /// Record a paused task
    pub async fn insert(&self, pending: &PendingApproval) -> Result<()> {
        let record = serde_json::to_string(pending)?;
        self.store.put_pending(pending.task.id, &record).await?;
        debug!(task_id = %pending.task.id, "Task awaiting approval");
        Ok(())
    }

    /// Remove a paused task; `None` if it is unknown or already resolved
    pub async fn take(&self, task_id: Uuid) -> Result<Option<PendingApproval>> {
        match self.store.take_pending(task_id).await? {
            Some(record) => Ok(Some(serde_json::from_str(&record)?)),
            None => Ok(None),
        }
    }

    /// Paused tasks, oldest first
    pub async fn list(&self) -> Result<Vec<PendingSummary>> {
        let mut list: Vec<PendingSummary> = self
            .store
            .list_pending()
            .await?
            .iter()
            .filter_map(|record| match serde_json::from_str::<PendingApproval>(record) {
                Ok(pending) => Some(pending.summary()),
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable pending approval");
                    None
                }
            })
            .collect();
        list.sort_by_key(|s| s.created_at);
        Ok(list)
    }
}

impl std::fmt::Debug for ApprovalLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApprovalLedger")
            .field("store", &self.store.name())
            .finish()
    }
}
