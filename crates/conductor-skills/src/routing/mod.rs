//! Candidate routing

pub mod router;

pub use router::{CandidateScore, RouterConfig, RoutingDecision, RoutingWeights, SkillRouter};
