//! # Conductor Core - Orchestration Engine
//!
//! This crate drives a task from submission to a stored, provenance-rich
//! result:
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`Engine`] | State machine: plan, route, gate, execute, validate |
//! | [`Planner`] | Builds a single-step plan from the skill registry |
//! | [`Executor`] | Dispatches a skill to its registered capability |
//! | [`Validator`] | Runs the contract check battery on a successful outcome |
//! | [`IdempotencyStore`] | At-most-once execution per idempotency key |
//! | [`ApprovalLedger`] | Tasks paused until an approver decides |
//! | [`EventBus`] | Broadcast of progress events |
//!
//! ## Task Flow
//!
//! ```text
//! TaskSubmission ──► reserve key ──► plan ──► route ──► approval gate
//!                        │                                   │
//!                   stored result                  ┌─────────┴─────────┐
//!                   (replayed)                     ▼                   ▼
//!                                          awaiting_approval       executing
//!                                           approve / reject     primary → alternates
//!                                                                      │
//!                                                                validating
//!                                                                      │
//!                                                              AgentResult (stored)
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use conductor_core::{Engine, EngineConfig, Executor, TaskSubmission};
//!
//! let engine = Engine::new(registry, Arc::new(executor), EngineConfig::default());
//! let result = engine
//!     .submit(TaskSubmission::new("ENG", "Add a health check").with_idempotency_key("req-1"))
//!     .await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod approval;
pub mod engine;
pub mod error;
pub mod event_bus;
pub mod executor;
pub mod idempotency;
pub mod planner;
pub mod task;
pub mod validator;

pub use approval::{ApprovalLedger, PendingApproval, PendingSummary};
pub use engine::{
    AgentResult, Engine, EngineConfig, EngineState, ExecutionAttempt, Provenance, StageClock,
    StageRecord, TaskStatus,
};
pub use error::{Error, ErrorKind, Result};
pub use event_bus::{EngineEvent, EventBus};
pub use executor::{ExecutionOutcome, Executor, OutcomeStatus, SkillDispatch};
pub use idempotency::{IdempotencyStore, MemoryIdempotencyStore, RedisIdempotencyStore};
pub use planner::{ExecutionPlan, Planner, Step};
pub use task::{AutonomyMode, Task, TaskSubmission};
pub use validator::{CheckResult, OutputValidator, ValidationReport, Validator};
