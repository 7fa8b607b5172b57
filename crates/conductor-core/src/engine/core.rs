//! Engine core structure
//!
//! Contains the `Engine` struct, its builder methods and the lookups that
//! do not drive a task.

use crate::approval::{ApprovalLedger, PendingSummary};
use crate::error::Result;
use crate::event_bus::{EventBus, EngineEvent};
use crate::executor::SkillDispatch;
use crate::idempotency::{IdempotencyStore, MemoryIdempotencyStore};
use crate::planner::Planner;
use crate::validator::{OutputValidator, Validator};
use conductor_skills::{BenchmarkSource, SharedBenchmarks, SkillRegistry, SkillRouter};
use conductor_tools::{ArtifactStore, MemoryArtifactStore};
use dashmap::DashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use uuid::Uuid;

use super::clock::StageClock;
use super::config::EngineConfig;
use super::types::{AgentResult, EngineState};

/// Orchestration engine
pub struct Engine {
    pub(crate) registry: Arc<SkillRegistry>,
    pub(crate) planner: Planner,
    pub(crate) router: SkillRouter,
    pub(crate) benchmarks: Arc<dyn BenchmarkSource>,
    pub(crate) dispatcher: Arc<dyn SkillDispatch>,
    pub(crate) validator: Arc<dyn OutputValidator>,
    pub(crate) store: Arc<dyn IdempotencyStore>,
    pub(crate) artifacts: Arc<dyn ArtifactStore>,
    pub(crate) approvals: ApprovalLedger,
    pub(crate) event_bus: Option<Arc<EventBus>>,
    pub(crate) config: EngineConfig,
    /// Running tasks with their cancellation tokens
    pub(crate) active_tasks: Arc<DashMap<Uuid, CancellationToken>>,
}

impl Engine {
    /// Create an engine with in-memory store, artifacts and empty benchmarks
    #[must_use]
    pub fn new(
        registry: Arc<SkillRegistry>,
        dispatcher: Arc<dyn SkillDispatch>,
        config: EngineConfig,
    ) -> Self {
        let store: Arc<dyn IdempotencyStore> = Arc::new(MemoryIdempotencyStore::new());
        Self {
            planner: Planner::new(registry.clone()),
            router: SkillRouter::with_config(config.router.clone()),
            registry,
            benchmarks: Arc::new(SharedBenchmarks::default()),
            dispatcher,
            validator: Arc::new(Validator::new()),
            approvals: ApprovalLedger::new(store.clone()),
            store,
            artifacts: Arc::new(MemoryArtifactStore::new()),
            event_bus: None,
            config,
            active_tasks: Arc::new(DashMap::new()),
        }
    }

    /// Set the idempotency store, which also holds paused approvals
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn IdempotencyStore>) -> Self {
        self.approvals = ApprovalLedger::new(store.clone());
        self.store = store;
        self
    }

    /// Set the artifact store used for approval drafts
    #[must_use]
    pub fn with_artifact_store(mut self, artifacts: Arc<dyn ArtifactStore>) -> Self {
        self.artifacts = artifacts;
        self
    }

    /// Set the benchmark source
    #[must_use]
    pub fn with_benchmarks(mut self, benchmarks: Arc<dyn BenchmarkSource>) -> Self {
        self.benchmarks = benchmarks;
        self
    }

    /// Set the validator
    #[must_use]
    pub fn with_validator(mut self, validator: Arc<dyn OutputValidator>) -> Self {
        self.validator = validator;
        self
    }

    /// Set the event bus for progress events
    #[must_use]
    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(bus);
        self
    }

    /// Skill registry
    #[must_use]
    pub fn registry(&self) -> &Arc<SkillRegistry> {
        &self.registry
    }

    /// Event bus, if set
    #[must_use]
    pub fn event_bus(&self) -> Option<&Arc<EventBus>> {
        self.event_bus.as_ref()
    }

    /// Engine configuration
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Name of the idempotency backend
    #[must_use]
    pub fn store_name(&self) -> &str {
        self.store.name()
    }

    /// Number of tasks currently planning or executing
    #[must_use]
    pub fn active_task_count(&self) -> usize {
        self.active_tasks.len()
    }

    /// Tasks paused for approval on any engine sharing the store
    pub async fn pending_approvals(&self) -> Result<Vec<PendingSummary>> {
        self.approvals.list().await
    }

    /// Latest stored result of a task whose key is still held
    pub async fn get_task(&self, task_id: Uuid) -> Result<Option<AgentResult>> {
        let Some(key) = self.store.task_key(task_id).await? else {
            return Ok(None);
        };
        Ok(self
            .store
            .get(&key)
            .await?
            .filter(|result| result.task_id == task_id))
    }

    /// Cancel a paused or running task.
    ///
    /// A paused task is dropped from the ledger and its key released. A
    /// running task is signalled; its submitter receives the cancelled
    /// result. Returns `false` if the task is neither paused nor running.
    pub async fn cancel(&self, task_id: Uuid) -> Result<bool> {
        if let Some(pending) = self.approvals.take(task_id).await? {
            self.store.release(&pending.task.idempotency_key).await?;
            self.emit(EngineEvent::TaskCancelled { task_id });
            info!(task_id = %task_id, "Paused task cancelled");
            return Ok(true);
        }

        if let Some((_id, token)) = self.active_tasks.remove(&task_id) {
            token.cancel();
            info!(task_id = %task_id, "Running task signalled to cancel");
            return Ok(true);
        }

        Ok(false)
    }

    pub(crate) fn emit(&self, event: EngineEvent) {
        if let Some(bus) = &self.event_bus {
            bus.publish(event);
        }
    }

    pub(crate) fn enter(&self, clock: &mut StageClock, task_id: Uuid, state: EngineState) {
        clock.enter(state);
        debug!(task_id = %task_id, state = %state, "Stage entered");
        self.emit(EngineEvent::StageEntered { task_id, state });
    }

    pub(crate) async fn release_quietly(&self, key: &str) {
        if let Err(e) = self.store.release(key).await {
            error!(key = %key, error = %e, "Failed to release idempotency key");
        }
    }
}
