//! Engine - the orchestration state machine
//!
//! ```text
//! received → planning → routing → (awaiting_approval | executing) → validating → completed
//!               │          │              │                │
//!               └──────────┴──────────────┴────────────────┴──────→ failed
//! ```
//!
//! # Module Structure
//!
//! - `types`: result and provenance types
//! - `config`: `EngineConfig`
//! - `clock`: per-state timing
//! - `core`: `Engine` struct, builder methods, cancellation, lookups
//! - `process`: submission, idempotency reservation, planning, routing
//! - `execution`: primary/alternate attempts and validation
//! - `guard`: key release for submissions dropped mid-flight
//! - `resume`: approve / reject of paused tasks
//! - `result_builder`: terminal result assembly and persistence

mod clock;
mod config;
mod core;
mod execution;
mod guard;
mod process;
mod result_builder;
mod resume;
mod types;

#[cfg(test)]
mod tests;

pub use self::core::Engine;
pub use clock::StageClock;
pub use config::EngineConfig;
pub use types::{
    AgentResult, EngineState, ExecutionAttempt, Provenance, StageRecord, TaskStatus,
};
