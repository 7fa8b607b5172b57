use super::*;
use crate::error::{Error, ErrorKind};
use crate::event_bus::{EngineEvent, EventBus};
use crate::executor::{ExecutionOutcome, MockSkillDispatch, SkillDispatch};
use crate::idempotency::{IdempotencyStore, MemoryIdempotencyStore};
use crate::task::{AutonomyMode, Task, TaskSubmission};
use crate::validator::{OutputValidator, ValidationReport};
use conductor_skills::{
    BenchmarkSnapshot, BenchmarkStat, SharedBenchmarks, Skill, SkillId, SkillRegistry,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn registry() -> Arc<SkillRegistry> {
    Arc::new(
        SkillRegistry::new(vec![
            Skill::new("RES-001", "research", "web_search").with_cost_estimate(0.02),
            Skill::new("RES-002", "research", "data_aggregation").with_cost_estimate(0.01),
            Skill::new("COM-001", "communication", "email_sender").with_requires_approval(true),
        ])
        .unwrap(),
    )
}

fn benchmarks() -> Arc<SharedBenchmarks> {
    Arc::new(SharedBenchmarks::new(BenchmarkSnapshot::from_stats([
        BenchmarkStat::new("RES-001", 1000.0, 0.95, 0.02, 100),
        BenchmarkStat::new("RES-002", 4000.0, 0.80, 0.01, 100),
    ])))
}

fn ok(skill: &Skill) -> ExecutionOutcome {
    ExecutionOutcome::success(
        skill.id.clone(),
        serde_json::json!({"status": "success", "skill": skill.id.as_str()}),
        Vec::new(),
    )
}

fn engine(dispatch: impl SkillDispatch + 'static) -> Engine {
    Engine::new(registry(), Arc::new(dispatch), EngineConfig::default())
        .with_benchmarks(benchmarks())
}

fn research(key: &str) -> TaskSubmission {
    TaskSubmission::new("research", "Summarise the market").with_idempotency_key(key)
}

fn email(key: &str) -> TaskSubmission {
    TaskSubmission::new("communication", "Send the weekly update")
        .with_idempotency_key(key)
        .with_autonomy_mode(AutonomyMode::Approver)
}

/// Dispatcher that sleeps before succeeding
struct SlowDispatch {
    delay: Duration,
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl SkillDispatch for SlowDispatch {
    async fn execute(&self, skill: &Skill, _task: &Task) -> ExecutionOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        ok(skill)
    }
}

fn slow(delay: Duration) -> SlowDispatch {
    SlowDispatch {
        delay,
        calls: AtomicUsize::new(0),
    }
}

#[tokio::test]
async fn test_completes_with_primary() {
    let mut mock = MockSkillDispatch::new();
    mock.expect_execute().times(1).returning(|skill, _| ok(skill));
    let engine = engine(mock);

    let result = engine.submit(research("k-1")).await.unwrap();

    assert_eq!(result.status, TaskStatus::Completed);
    assert_eq!(result.provenance.execution_attempts.len(), 1);
    assert_eq!(
        result.provenance.routing_decision.as_ref().unwrap().primary.skill_id,
        SkillId::from("RES-001")
    );
    assert!(result.provenance.validation_report.as_ref().unwrap().aggregate_passed);
    assert!((result.provenance.total_cost - 0.02).abs() < 1e-9);

    let states: Vec<EngineState> = result.provenance.stages.iter().map(|s| s.state).collect();
    assert_eq!(
        states,
        vec![
            EngineState::Received,
            EngineState::Planning,
            EngineState::Routing,
            EngineState::Executing,
            EngineState::Validating,
            EngineState::Completed,
        ]
    );
}

#[tokio::test]
async fn test_missing_key_is_rejected() {
    let mut mock = MockSkillDispatch::new();
    mock.expect_execute().times(0);
    let engine = engine(mock);

    let err = engine
        .submit(TaskSubmission::new("research", "no key"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MissingIdempotencyKey));
    assert!(err.is_client_error());
}

#[tokio::test]
async fn test_fallback_to_alternate() {
    let mut mock = MockSkillDispatch::new();
    mock.expect_execute().times(2).returning(|skill, _| {
        if skill.id.as_str() == "RES-001" {
            ExecutionOutcome::failure(skill.id.clone(), ErrorKind::capability("upstream 503"))
        } else {
            ok(skill)
        }
    });
    let engine = engine(mock);

    let result = engine.submit(research("k-fallback")).await.unwrap();

    assert_eq!(result.status, TaskStatus::Completed);
    let attempts = &result.provenance.execution_attempts;
    assert_eq!(attempts.len(), 2);
    assert!(!attempts[0].outcome.is_success());
    assert_eq!(attempts[1].outcome.skill_id, SkillId::from("RES-002"));
    assert!((result.provenance.total_cost - 0.03).abs() < 1e-9);
}

#[tokio::test]
async fn test_all_attempts_fail() {
    let mut mock = MockSkillDispatch::new();
    mock.expect_execute().times(2).returning(|skill, _| {
        ExecutionOutcome::failure(skill.id.clone(), ErrorKind::capability("boom"))
    });
    let engine = engine(mock);

    let result = engine.submit(research("k-fail")).await.unwrap();

    assert_eq!(result.status, TaskStatus::Failed);
    assert_eq!(result.error(), Some(&ErrorKind::capability("boom")));
    assert!(result.provenance.validation_report.is_none());
    assert_eq!(
        result.provenance.stages.last().map(|s| s.state),
        Some(EngineState::Failed)
    );
}

#[tokio::test]
async fn test_attempt_timeout_falls_back() {
    let engine = Engine::new(
        registry(),
        Arc::new(slow(Duration::from_millis(500))),
        EngineConfig::default().with_attempt_timeout(Duration::from_millis(20)),
    )
    .with_benchmarks(benchmarks());

    let result = engine.submit(research("k-timeout")).await.unwrap();

    assert_eq!(result.status, TaskStatus::Failed);
    assert_eq!(result.error(), Some(&ErrorKind::Timeout));
    assert_eq!(result.provenance.execution_attempts.len(), 2);
}

#[tokio::test]
async fn test_unknown_task_type_is_cached() {
    let mut mock = MockSkillDispatch::new();
    mock.expect_execute().times(0);
    let engine = engine(mock);

    let first = engine
        .submit(TaskSubmission::new("astrology", "x").with_idempotency_key("k-unknown"))
        .await
        .unwrap();
    assert_eq!(first.status, TaskStatus::Failed);
    assert_eq!(first.error(), Some(&ErrorKind::UnknownTaskType));
    assert!(first.provenance.routing_decision.is_none());

    let second = engine
        .submit(TaskSubmission::new("astrology", "x").with_idempotency_key("k-unknown"))
        .await
        .unwrap();
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[tokio::test]
async fn test_replay_returns_identical_result() {
    let mut mock = MockSkillDispatch::new();
    mock.expect_execute().times(1).returning(|skill, _| ok(skill));
    let bus = Arc::new(EventBus::default());
    let mut rx = bus.subscribe();
    let engine = engine(mock).with_event_bus(bus);

    let first = engine.submit(research("k-replay")).await.unwrap();
    let second = engine.submit(research("k-replay")).await.unwrap();

    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );

    let mut replayed = false;
    while let Ok(event) = rx.try_recv() {
        if let EngineEvent::TaskReplayed { task_id } = event {
            assert_eq!(task_id, first.task_id);
            replayed = true;
        }
    }
    assert!(replayed);
}

#[tokio::test]
async fn test_concurrent_duplicates_execute_once() {
    let dispatch = Arc::new(slow(Duration::from_millis(50)));
    let engine = Arc::new(
        Engine::new(
            registry(),
            dispatch.clone(),
            EngineConfig::default().with_replay_poll_interval(Duration::from_millis(5)),
        )
        .with_benchmarks(benchmarks()),
    );

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let engine = engine.clone();
            tokio::spawn(async move { engine.submit(research("k-concurrent")).await.unwrap() })
        })
        .collect();

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap());
    }

    assert_eq!(dispatch.calls.load(Ordering::SeqCst), 1);
    assert!(results.iter().all(|r| r.task_id == results[0].task_id));
}

#[tokio::test]
async fn test_duplicate_wait_gives_up() {
    let store = Arc::new(MemoryIdempotencyStore::new());
    assert!(store.try_reserve("k-held").await.unwrap());

    let mut mock = MockSkillDispatch::new();
    mock.expect_execute().times(0);
    let engine = engine(mock).with_store(store);
    let engine = Engine {
        config: EngineConfig::default()
            .with_replay_poll_interval(Duration::from_millis(5))
            .with_replay_wait_timeout(Duration::from_millis(30)),
        ..engine
    };

    let err = engine.submit(research("k-held")).await.unwrap_err();
    assert!(matches!(err, Error::DuplicateSubmission { ref key } if key == "k-held"));
}

#[tokio::test]
async fn test_approval_gate_and_approve() {
    let mut mock = MockSkillDispatch::new();
    mock.expect_execute().times(1).returning(|skill, _| ok(skill));
    let engine = engine(mock);

    let paused = engine.submit(email("k-email")).await.unwrap();
    assert_eq!(paused.status, TaskStatus::AwaitingApproval);
    assert!(paused.provenance.execution_attempts.is_empty());
    assert!(paused.provenance.draft_artifact.is_some());
    assert_eq!(engine.pending_approvals().await.unwrap().len(), 1);

    // Replaying a paused key returns the paused result without executing
    let replay = engine.submit(email("k-email")).await.unwrap();
    assert_eq!(replay.status, TaskStatus::AwaitingApproval);

    let approved = engine.approve(paused.task_id).await.unwrap();
    assert_eq!(approved.status, TaskStatus::Completed);
    assert_eq!(approved.task_id, paused.task_id);
    assert_eq!(approved.provenance.draft_artifact, paused.provenance.draft_artifact);
    assert!(approved
        .provenance
        .stages
        .iter()
        .any(|s| s.state == EngineState::AwaitingApproval));

    let stored = engine.get_task(paused.task_id).await.unwrap().unwrap();
    assert_eq!(stored.status, TaskStatus::Completed);

    let again = engine.approve(paused.task_id).await.unwrap_err();
    assert!(matches!(again, Error::NotAwaitingApproval(_)));
}

#[tokio::test]
async fn test_collaborator_skips_approval() {
    let mut mock = MockSkillDispatch::new();
    mock.expect_execute().times(1).returning(|skill, _| ok(skill));
    let engine = engine(mock);

    let result = engine
        .submit(email("k-collab").with_autonomy_mode(AutonomyMode::Collaborator))
        .await
        .unwrap();
    assert_eq!(result.status, TaskStatus::Completed);
    assert!(result.provenance.draft_artifact.is_none());
}

#[tokio::test]
async fn test_reject() {
    let mut mock = MockSkillDispatch::new();
    mock.expect_execute().times(0);
    let engine = engine(mock);

    let paused = engine.submit(email("k-reject")).await.unwrap();
    let rejected = engine
        .reject(paused.task_id, Some("wrong recipient".to_string()))
        .await
        .unwrap();

    assert_eq!(rejected.status, TaskStatus::Failed);
    assert_eq!(
        rejected.error(),
        Some(&ErrorKind::ApprovalRejected {
            reason: Some("wrong recipient".to_string())
        })
    );

    let replay = engine.submit(email("k-reject")).await.unwrap();
    assert_eq!(replay.status, TaskStatus::Failed);
}

#[tokio::test]
async fn test_unknown_task_id() {
    let mut mock = MockSkillDispatch::new();
    mock.expect_execute().times(0);
    let engine = engine(mock);

    let err = engine.approve(uuid::Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, Error::TaskNotFound(_)));
    assert!(!engine.cancel(uuid::Uuid::new_v4()).await.unwrap());
}

#[tokio::test]
async fn test_cancel_paused_releases_key() {
    let mut mock = MockSkillDispatch::new();
    mock.expect_execute().times(0);
    let engine = engine(mock);

    let paused = engine.submit(email("k-cancel-paused")).await.unwrap();
    assert!(engine.cancel(paused.task_id).await.unwrap());
    assert!(engine.pending_approvals().await.unwrap().is_empty());

    // Key is free: resubmitting starts a new task
    let again = engine.submit(email("k-cancel-paused")).await.unwrap();
    assert_eq!(again.status, TaskStatus::AwaitingApproval);
    assert_ne!(again.task_id, paused.task_id);
}

#[tokio::test]
async fn test_cancel_running_task() {
    let engine = Arc::new(
        Engine::new(
            registry(),
            Arc::new(slow(Duration::from_secs(5))),
            EngineConfig::default(),
        )
        .with_benchmarks(benchmarks()),
    );
    let token = CancellationToken::new();

    let handle = {
        let engine = engine.clone();
        let token = token.clone();
        tokio::spawn(async move { engine.submit_with_token(research("k-cancel"), token).await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(engine.active_task_count(), 1);
    token.cancel();

    let result = handle.await.unwrap().unwrap();
    assert_eq!(result.status, TaskStatus::Failed);
    assert_eq!(result.error(), Some(&ErrorKind::Cancelled));
    assert_eq!(result.provenance.execution_attempts.len(), 1);
    assert_eq!(engine.active_task_count(), 0);

    // Cancelled results are not stored
    assert!(engine.get_task(result.task_id).await.unwrap().is_none());
}

fn shared(dispatch: impl SkillDispatch + 'static, store: &Arc<dyn IdempotencyStore>) -> Engine {
    engine(dispatch).with_store(store.clone())
}

#[tokio::test]
async fn test_dropped_submission_frees_key() {
    let store: Arc<dyn IdempotencyStore> = Arc::new(MemoryIdempotencyStore::new());
    let stalled = Arc::new(shared(slow(Duration::from_secs(5)), &store));

    let handle = {
        let engine = stalled.clone();
        tokio::spawn(async move { engine.submit(research("k-dropped")).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(stalled.active_task_count(), 1);

    handle.abort();
    assert!(handle.await.unwrap_err().is_cancelled());
    // The key is released from a spawned task
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(stalled.active_task_count(), 0);

    let mut mock = MockSkillDispatch::new();
    mock.expect_execute().times(1).returning(|skill, _| ok(skill));
    let retry = Engine {
        config: EngineConfig::default()
            .with_replay_poll_interval(Duration::from_millis(5))
            .with_replay_wait_timeout(Duration::from_millis(300)),
        ..shared(mock, &store)
    };

    let result = retry.submit(research("k-dropped")).await.unwrap();
    assert_eq!(result.status, TaskStatus::Completed);
}

#[tokio::test]
async fn test_paused_task_approved_by_another_engine() {
    let store: Arc<dyn IdempotencyStore> = Arc::new(MemoryIdempotencyStore::new());

    let paused = {
        let mut mock = MockSkillDispatch::new();
        mock.expect_execute().times(0);
        let first = shared(mock, &store);
        first.submit(email("k-handoff")).await.unwrap()
    };
    assert_eq!(paused.status, TaskStatus::AwaitingApproval);

    let mut mock = MockSkillDispatch::new();
    mock.expect_execute().times(1).returning(|skill, _| ok(skill));
    let second = shared(mock, &store);

    let listed = second.pending_approvals().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].task_id, paused.task_id);

    let approved = second.approve(paused.task_id).await.unwrap();
    assert_eq!(approved.status, TaskStatus::Completed);
    assert_eq!(approved.provenance.draft_artifact, paused.provenance.draft_artifact);
    let states: Vec<EngineState> = approved.provenance.stages.iter().map(|s| s.state).collect();
    assert_eq!(
        states,
        vec![
            EngineState::Received,
            EngineState::Planning,
            EngineState::Routing,
            EngineState::AwaitingApproval,
            EngineState::Executing,
            EngineState::Validating,
            EngineState::Completed,
        ]
    );

    let stored = second.get_task(paused.task_id).await.unwrap().unwrap();
    assert_eq!(stored.status, TaskStatus::Completed);
}

#[tokio::test]
async fn test_paused_task_cancelled_by_another_engine() {
    let store: Arc<dyn IdempotencyStore> = Arc::new(MemoryIdempotencyStore::new());
    let mut mock = MockSkillDispatch::new();
    mock.expect_execute().times(0);
    let first = shared(mock, &store);
    let mut mock = MockSkillDispatch::new();
    mock.expect_execute().times(0);
    let second = shared(mock, &store);

    let paused = first.submit(email("k-elsewhere")).await.unwrap();
    assert!(second.cancel(paused.task_id).await.unwrap());
    assert!(first.pending_approvals().await.unwrap().is_empty());

    let err = first.approve(paused.task_id).await.unwrap_err();
    assert!(matches!(err, Error::TaskNotFound(_)));

    let again = first.submit(email("k-elsewhere")).await.unwrap();
    assert_ne!(again.task_id, paused.task_id);
    let rejected = second.reject(again.task_id, None).await.unwrap();
    assert_eq!(rejected.status, TaskStatus::Failed);
}

#[tokio::test]
async fn test_task_lookup_follows_key() {
    let store: Arc<dyn IdempotencyStore> = Arc::new(MemoryIdempotencyStore::new());
    let mut mock = MockSkillDispatch::new();
    mock.expect_execute().times(1).returning(|skill, _| ok(skill));
    let first = shared(mock, &store);
    let mut mock = MockSkillDispatch::new();
    mock.expect_execute().times(0);
    let second = shared(mock, &store);

    let result = first.submit(research("k-lookup")).await.unwrap();
    assert_eq!(
        second.get_task(result.task_id).await.unwrap().unwrap().task_id,
        result.task_id
    );

    store.release("k-lookup").await.unwrap();
    assert!(second.get_task(result.task_id).await.unwrap().is_none());
    assert!(first.get_task(result.task_id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_failed_validation_still_completes() {
    let mut mock = MockSkillDispatch::new();
    mock.expect_execute().times(1).returning(|skill, _| {
        ExecutionOutcome::success(
            skill.id.clone(),
            serde_json::json!({"no_status": true}),
            Vec::new(),
        )
    });
    let engine = engine(mock);

    let result = engine.submit(research("k-invalid")).await.unwrap();

    assert_eq!(result.status, TaskStatus::Completed);
    let report = result.provenance.validation_report.as_ref().unwrap();
    assert!(!report.aggregate_passed);
    assert_eq!(report.failed_checks(), vec!["output_schema"]);
    assert!(result.provenance.error.is_none());
}

/// Validator that never finishes inside the deadline
struct StalledValidator;

#[async_trait::async_trait]
impl OutputValidator for StalledValidator {
    async fn validate(&self, _outcome: &ExecutionOutcome, _skill: &Skill) -> ValidationReport {
        tokio::time::sleep(Duration::from_secs(10)).await;
        ValidationReport::from_checks(Vec::new())
    }
}

#[tokio::test]
async fn test_validation_deadline() {
    let mut mock = MockSkillDispatch::new();
    mock.expect_execute().times(1).returning(|skill, _| ok(skill));
    let engine = Engine::new(
        registry(),
        Arc::new(mock),
        EngineConfig::default().with_validation_timeout(Duration::from_millis(20)),
    )
    .with_benchmarks(benchmarks())
    .with_validator(Arc::new(StalledValidator));

    let result = engine.submit(research("k-deadline")).await.unwrap();

    assert_eq!(result.status, TaskStatus::Completed);
    assert_eq!(result.error(), Some(&ErrorKind::ValidationIncomplete));
    assert!(result.result.is_some());
    let report = result.provenance.validation_report.as_ref().unwrap();
    assert!(!report.aggregate_passed);
    assert_eq!(report.failed_checks(), vec!["validation_deadline"]);
}

#[tokio::test]
async fn test_routing_weights_override() {
    let mut mock = MockSkillDispatch::new();
    mock.expect_execute().times(1).returning(|skill, _| ok(skill));
    let engine = engine(mock);

    // Cost-only weighting favours the cheaper RES-002
    let result = engine
        .submit(research("k-weights").with_constraint(
            "routing_weights",
            serde_json::json!({"success": 0.0, "latency": 0.0, "cost": 1.0}),
        ))
        .await
        .unwrap();

    let decision = result.provenance.routing_decision.as_ref().unwrap();
    assert_eq!(decision.primary.skill_id, SkillId::from("RES-002"));
    assert_eq!(decision.weights.cost, 1.0);
}

#[tokio::test]
async fn test_invalid_weights_override_is_ignored() {
    let mut mock = MockSkillDispatch::new();
    mock.expect_execute().times(1).returning(|skill, _| ok(skill));
    let engine = engine(mock);

    let result = engine
        .submit(research("k-bad-weights").with_constraint(
            "routing_weights",
            serde_json::json!({"success": 0.9, "latency": 0.9, "cost": 0.9}),
        ))
        .await
        .unwrap();

    let decision = result.provenance.routing_decision.as_ref().unwrap();
    assert_eq!(decision.weights, engine.config().router.weights);
    assert_eq!(decision.primary.skill_id, SkillId::from("RES-001"));
}

#[tokio::test]
async fn test_events_follow_stages() {
    let mut mock = MockSkillDispatch::new();
    mock.expect_execute().times(1).returning(|skill, _| ok(skill));
    let bus = Arc::new(EventBus::default());
    let mut rx = bus.subscribe();
    let engine = engine(mock).with_event_bus(bus);

    let result = engine.submit(research("k-events")).await.unwrap();

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        assert_eq!(event.task_id(), result.task_id);
        events.push(event);
    }
    assert!(matches!(events.first(), Some(EngineEvent::TaskReceived { .. })));
    assert!(matches!(
        events.last(),
        Some(EngineEvent::TaskCompleted {
            validation_passed: true,
            ..
        })
    ));
}
