//! Approval resolution
//!
//! `approve` re-enters `executing` with the routing decision computed before
//! the pause; `reject` ends the task as failed. Paused tasks are read from
//! the store, so any engine sharing it can resolve them.

use crate::approval::PendingApproval;
use crate::error::{Error, ErrorKind, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};
use uuid::Uuid;

use super::core::Engine;
use super::guard::ReservationGuard;
use super::types::{AgentResult, Provenance};

impl Engine {
    /// Approve a paused task and run it
    #[instrument(skip(self))]
    pub async fn approve(&self, task_id: Uuid) -> Result<AgentResult> {
        let pending = self.take_pending(task_id).await?;
        info!(task_id = %task_id, "Approval granted, resuming execution");

        let key = pending.task.idempotency_key.clone();
        let cancel = CancellationToken::new();
        let guard = ReservationGuard::new(self, task_id, &key, cancel.clone());
        let clock = pending.resume_clock();

        let outcome = self
            .execute(
                pending.task,
                pending.plan,
                pending.decision,
                clock,
                pending.draft_artifact,
                cancel,
            )
            .await;

        if outcome.is_err() {
            self.release_quietly(&key).await;
        }
        guard.disarm();
        outcome
    }

    /// Reject a paused task
    #[instrument(skip(self))]
    pub async fn reject(&self, task_id: Uuid, reason: Option<String>) -> Result<AgentResult> {
        let pending = self.take_pending(task_id).await?;
        info!(task_id = %task_id, reason = ?reason, "Approval rejected");

        let clock = pending.resume_clock();
        let provenance = Provenance {
            plan: Some(pending.plan),
            routing_decision: Some(pending.decision),
            draft_artifact: pending.draft_artifact,
            ..Default::default()
        };
        self.fail(
            &pending.task,
            clock,
            provenance,
            ErrorKind::ApprovalRejected { reason },
        )
        .await
    }

    /// Claim a paused task from the shared ledger
    async fn take_pending(&self, task_id: Uuid) -> Result<PendingApproval> {
        if let Some(pending) = self.approvals.take(task_id).await? {
            return Ok(pending);
        }
        if self.store.task_key(task_id).await?.is_some() {
            return Err(Error::NotAwaitingApproval(task_id));
        }
        Err(Error::TaskNotFound(task_id))
    }
}
