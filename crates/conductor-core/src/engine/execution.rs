//! Engine execution
//!
//! Runs the primary and then each alternate until one succeeds, then
//! validates the successful outcome.

use crate::error::{ErrorKind, Result};
use crate::event_bus::EngineEvent;
use crate::executor::ExecutionOutcome;
use crate::planner::ExecutionPlan;
use crate::task::Task;
use crate::validator::{CheckResult, ValidationReport};
use conductor_skills::{RoutingDecision, Skill};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::clock::StageClock;
use super::core::Engine;
use super::types::{AgentResult, EngineState, ExecutionAttempt, Provenance};

impl Engine {
    pub(crate) async fn execute(
        &self,
        task: Task,
        plan: ExecutionPlan,
        decision: RoutingDecision,
        mut clock: StageClock,
        draft_artifact: Option<String>,
        cancel: CancellationToken,
    ) -> Result<AgentResult> {
        self.enter(&mut clock, task.id, EngineState::Executing);

        let mut attempts: Vec<ExecutionAttempt> = Vec::new();
        let mut succeeded: Option<(Arc<Skill>, ExecutionOutcome)> = None;
        let mut cancelled = false;

        for (index, candidate) in decision.attempt_order().enumerate() {
            let attempt = index + 1;

            let Some(skill) = self.registry.get(&candidate.skill_id) else {
                warn!(
                    task_id = %task.id,
                    skill_id = %candidate.skill_id,
                    "Routed skill is not registered"
                );
                attempts.push(ExecutionAttempt {
                    attempt,
                    outcome: ExecutionOutcome::failure(
                        candidate.skill_id.clone(),
                        ErrorKind::capability("skill is not registered"),
                    ),
                    duration_ms: 0,
                    cost: 0.0,
                });
                continue;
            };

            let deadline = skill
                .timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(self.config.attempt_timeout);
            let started = Instant::now();

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    cancelled = true;
                    ExecutionOutcome::failure(skill.id.clone(), ErrorKind::Cancelled)
                }
                res = tokio::time::timeout(deadline, self.dispatcher.execute(&skill, &task)) => {
                    match res {
                        Ok(outcome) => outcome,
                        Err(_) => {
                            warn!(
                                task_id = %task.id,
                                skill_id = %skill.id,
                                timeout_ms = deadline.as_millis() as u64,
                                "Attempt timed out"
                            );
                            ExecutionOutcome::failure(skill.id.clone(), ErrorKind::Timeout)
                        }
                    }
                }
            };

            let duration_ms = started.elapsed().as_millis() as u64;
            let success = outcome.is_success();
            self.emit(EngineEvent::AttemptFinished {
                task_id: task.id,
                skill_id: skill.id.clone(),
                attempt,
                success,
                duration_ms,
            });
            attempts.push(ExecutionAttempt {
                attempt,
                outcome: outcome.clone(),
                duration_ms,
                cost: skill.cost_estimate,
            });

            if cancelled {
                break;
            }
            if success {
                debug!(task_id = %task.id, skill_id = %skill.id, attempt, "Attempt succeeded");
                succeeded = Some((skill, outcome));
                break;
            }
            warn!(
                task_id = %task.id,
                skill_id = %skill.id,
                attempt,
                error = ?outcome.error,
                "Attempt failed"
            );
        }

        let mut provenance = Provenance {
            plan: Some(plan),
            routing_decision: Some(decision),
            execution_attempts: attempts,
            draft_artifact,
            ..Default::default()
        };

        if cancelled {
            return self.cancelled(&task, clock, provenance).await;
        }

        let Some((skill, outcome)) = succeeded else {
            let last_error = provenance
                .execution_attempts
                .last()
                .and_then(|a| a.outcome.error.clone())
                .unwrap_or_else(|| ErrorKind::capability("no attempt was made"));
            return self.fail(&task, clock, provenance, last_error).await;
        };

        self.enter(&mut clock, task.id, EngineState::Validating);
        let timeout = self.config.validation_timeout;
        let validator = self.validator.clone();
        let checked = outcome.clone();
        let mut handle = tokio::spawn(async move { validator.validate(&checked, &skill).await });

        let report = match tokio::time::timeout(timeout, &mut handle).await {
            Ok(Ok(report)) => report,
            Ok(Err(e)) => {
                warn!(task_id = %task.id, error = %e, "Validation task failed");
                provenance.error = Some(ErrorKind::ValidationIncomplete);
                ValidationReport::from_checks(vec![CheckResult::fail("validator", e.to_string())])
            }
            Err(_) => {
                handle.abort();
                warn!(task_id = %task.id, "Validation deadline exceeded");
                provenance.error = Some(ErrorKind::ValidationIncomplete);
                ValidationReport::deadline_exceeded(timeout)
            }
        };
        provenance.validation_report = Some(report);

        self.complete(&task, clock, provenance, outcome).await
    }
}
