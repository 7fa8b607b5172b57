//! # Conductor Skills - Skill Catalog and Candidate Routing
//!
//! This crate holds the decision inputs of the orchestration engine:
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`SkillRegistry`] | Immutable, ordered skill catalog keyed by task type |
//! | [`BenchmarkSnapshot`] | Read-only per-skill latency / success / cost statistics |
//! | [`SharedBenchmarks`] | Out-of-band refreshable holder of the current snapshot |
//! | [`SkillRouter`] | Pure scoring of candidates into a [`RoutingDecision`] |
//!
//! ## Routing Flow
//!
//! ```text
//! candidates (registry order) + BenchmarkSnapshot + RoutingWeights
//!     │
//!     ▼
//! ┌────────────────────────────────────────────────────────────┐
//! │  SkillRouter                                                │
//! │  • weighted success / inverse latency / inverse cost       │
//! │  • cold-start prior for unmeasured skills                  │
//! │  • stable sort, ties keep declaration order                │
//! └────────────────────────────────────────────────────────────┘
//!     │
//!     ▼
//! RoutingDecision { primary, alternates, rationale }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod benchmark;
pub mod error;
pub mod registry;
pub mod routing;
pub mod skill;

pub use benchmark::{BenchmarkSnapshot, BenchmarkSource, BenchmarkStat, SharedBenchmarks};
pub use error::{Error, Result};
pub use registry::SkillRegistry;
pub use routing::{CandidateScore, RouterConfig, RoutingDecision, RoutingWeights, SkillRouter};
pub use skill::{DomainRule, OutputContract, Skill, SkillId, TaskType, TestRequirements};
