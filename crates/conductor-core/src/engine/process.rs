//! Engine submission flow
//!
//! Idempotency reservation, planning, routing and the approval gate.

use crate::error::{Error, ErrorKind, Result};
use crate::event_bus::EngineEvent;
use crate::planner::ExecutionPlan;
use crate::task::{AutonomyMode, Task, TaskSubmission};
use chrono::Utc;
use conductor_skills::{RoutingDecision, RoutingWeights};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use super::clock::StageClock;
use super::core::Engine;
use super::guard::ReservationGuard;
use super::result_builder::assemble;
use super::types::{AgentResult, EngineState, Provenance, TaskStatus};
use crate::approval::PendingApproval;

/// Outcome of claiming an idempotency key
enum Reservation {
    /// This submission owns the key
    Owned,
    /// A result is already stored
    Replay(AgentResult),
}

impl Engine {
    /// Submit a task and drive it to a terminal or paused state
    pub async fn submit(&self, submission: TaskSubmission) -> Result<AgentResult> {
        self.submit_with_token(submission, CancellationToken::new())
            .await
    }

    /// Submit a task that can also be cancelled through `cancel`
    #[instrument(skip(self, submission, cancel), fields(task_type = %submission.task_type))]
    pub async fn submit_with_token(
        &self,
        submission: TaskSubmission,
        cancel: CancellationToken,
    ) -> Result<AgentResult> {
        let task = Task::accept(submission)?;
        let key = task.idempotency_key.clone();

        if let Reservation::Replay(result) = self.reserve(&key).await? {
            info!(key = %key, task_id = %result.task_id, "Returning stored result");
            self.emit(EngineEvent::TaskReplayed {
                task_id: result.task_id,
            });
            return Ok(result);
        }

        let guard = ReservationGuard::new(self, task.id, &key, cancel.clone());
        self.store.index_task(task.id, &key).await?;

        let outcome = self.drive(task, cancel).await;

        if outcome.is_err() {
            self.release_quietly(&key).await;
        }
        guard.disarm();
        outcome
    }

    /// Claim `key`, or wait for the submission that holds it
    async fn reserve(&self, key: &str) -> Result<Reservation> {
        if let Some(result) = self.store.get(key).await? {
            return Ok(Reservation::Replay(result));
        }
        if self.store.try_reserve(key).await? {
            return Ok(Reservation::Owned);
        }

        info!(key = %key, "Key held by a concurrent submission, waiting for its result");
        let deadline = Instant::now() + self.config.replay_wait_timeout;
        loop {
            tokio::time::sleep(self.config.replay_poll_interval).await;

            if let Some(result) = self.store.get(key).await? {
                return Ok(Reservation::Replay(result));
            }
            // The holder released the key (cancelled or errored)
            if self.store.try_reserve(key).await? {
                return Ok(Reservation::Owned);
            }
            if Instant::now() >= deadline {
                warn!(key = %key, "Gave up waiting for concurrent submission");
                return Err(Error::DuplicateSubmission {
                    key: key.to_string(),
                });
            }
        }
    }

    async fn drive(&self, task: Task, cancel: CancellationToken) -> Result<AgentResult> {
        let mut clock = StageClock::start(EngineState::Received);
        info!(
            task_id = %task.id,
            task_type = %task.task_type,
            key = %task.idempotency_key,
            "Task received"
        );
        self.emit(EngineEvent::TaskReceived {
            task_id: task.id,
            task_type: task.task_type.to_string(),
        });

        self.enter(&mut clock, task.id, EngineState::Planning);
        let plan = match self.planner.plan(&task) {
            Ok(plan) => plan,
            Err(kind) => return self.fail(&task, clock, Provenance::default(), kind).await,
        };

        self.enter(&mut clock, task.id, EngineState::Routing);
        let snapshot = self.benchmarks.snapshot().await;
        let weights = self.weights_for(&task);
        let decision = match self
            .router
            .route_with_weights(plan.candidates(), &snapshot, &weights)
        {
            Ok(decision) => decision,
            Err(e) => {
                warn!(task_id = %task.id, error = %e, "Routing failed");
                let provenance = Provenance {
                    plan: Some(plan),
                    ..Default::default()
                };
                return self
                    .fail(&task, clock, provenance, ErrorKind::NoCandidatesScored)
                    .await;
            }
        };

        let primary = self.registry.require(&decision.primary.skill_id)?;
        if primary.requires_approval && task.autonomy_mode == AutonomyMode::Approver {
            return self.pause_for_approval(task, plan, decision, clock).await;
        }

        self.execute(task, plan, decision, clock, None, cancel).await
    }

    /// Per-task weight override from `constraints.routing_weights`
    fn weights_for(&self, task: &Task) -> RoutingWeights {
        let default = self.router.config().weights;
        match task.constraints.get("routing_weights") {
            None => default,
            Some(value) => match RoutingWeights::from_value(value) {
                Ok(weights) => weights,
                Err(e) => {
                    warn!(
                        task_id = %task.id,
                        error = %e,
                        "Ignoring invalid routing_weights override"
                    );
                    default
                }
            },
        }
    }

    async fn pause_for_approval(
        &self,
        task: Task,
        plan: ExecutionPlan,
        decision: RoutingDecision,
        mut clock: StageClock,
    ) -> Result<AgentResult> {
        self.enter(&mut clock, task.id, EngineState::AwaitingApproval);

        let draft = serde_json::json!({
            "status": "draft",
            "task_id": task.id,
            "skill_id": decision.primary.skill_id,
            "description": task.description,
            "context": task.context,
        });
        let draft_uri = self.artifacts.put(serde_json::to_vec(&draft)?).await?;

        let provenance = Provenance {
            plan: Some(plan.clone()),
            routing_decision: Some(decision.clone()),
            stages: clock.snapshot(),
            draft_artifact: Some(draft_uri.clone()),
            ..Default::default()
        };
        let result = assemble(&task, TaskStatus::AwaitingApproval, None, Vec::new(), provenance);
        self.persist(&result).await?;

        let task_id = task.id;
        let skill_id = decision.primary.skill_id.clone();
        self.approvals
            .insert(&PendingApproval {
                task,
                plan,
                decision,
                stages: clock.closed(),
                draft_artifact: Some(draft_uri.clone()),
                created_at: Utc::now(),
            })
            .await?;

        info!(
            task_id = %task_id,
            skill_id = %skill_id,
            draft = %draft_uri,
            "Task awaiting approval"
        );
        self.emit(EngineEvent::ApprovalRequired { task_id, skill_id });

        Ok(result)
    }
}
