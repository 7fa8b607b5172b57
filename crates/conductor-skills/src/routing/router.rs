//! Skill router for ranking candidate skills.
//!
//! The router turns an ordered candidate set and a benchmark snapshot into a
//! [`RoutingDecision`]: one primary skill and up to `max_alternates`
//! fallbacks.
//!
//! # Scoring
//!
//! | Factor | Default weight | Normalisation |
//! |--------|----------------|---------------|
//! | Success rate | 0.5 | clamped to 0..=1 |
//! | Latency | 0.3 | `max(0, 1 - p50 / latency_ceiling_ms)` |
//! | Cost | 0.2 | `max(0, 1 - avg_cost / cost_ceiling)` |
//!
//! Skills without samples get `cold_start_prior` instead of a computed score,
//! so they stay eligible without being favoured.
//!
//! Candidates are sorted by score with a stable sort, so equal scores keep
//! the order the candidates were given in (registry declaration order).
//! Routing performs no I/O and reads no clock: identical inputs yield an
//! identical decision.

use crate::benchmark::{BenchmarkSnapshot, BenchmarkStat};
use crate::error::{Error, Result};
use crate::skill::SkillId;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Tolerance for the weights summing to 1.0
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Relative weight of each scoring factor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoutingWeights {
    /// Weight for success rate
    pub success: f64,
    /// Weight for inverse latency
    pub latency: f64,
    /// Weight for inverse cost
    pub cost: f64,
}

impl Default for RoutingWeights {
    fn default() -> Self {
        Self {
            success: 0.5,
            latency: 0.3,
            cost: 0.2,
        }
    }
}

impl RoutingWeights {
    /// Create weights
    #[must_use]
    pub fn new(success: f64, latency: f64, cost: f64) -> Self {
        Self {
            success,
            latency,
            cost,
        }
    }

    /// Check that every weight is non-negative and they sum to 1.0
    pub fn validate(&self) -> Result<()> {
        let all = [self.success, self.latency, self.cost];
        if all.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(Error::InvalidWeights(format!(
                "weights must be finite and non-negative: {:?}",
                self
            )));
        }
        let sum: f64 = all.iter().sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(Error::InvalidWeights(format!(
                "weights sum to {}, expected 1.0",
                sum
            )));
        }
        Ok(())
    }

    /// Parse and validate weights from a JSON value such as a task constraint
    pub fn from_value(value: &serde_json::Value) -> Result<Self> {
        let weights: Self = serde_json::from_value(value.clone())
            .map_err(|e| Error::InvalidWeights(e.to_string()))?;
        weights.validate()?;
        Ok(weights)
    }
}

/// Configuration for the skill router
#[derive(Debug, Clone, PartialEq)]
pub struct RouterConfig {
    /// Default weights
    pub weights: RoutingWeights,
    /// Score given to skills with no samples
    pub cold_start_prior: f64,
    /// Latency at or above which the latency factor is zero
    pub latency_ceiling_ms: f64,
    /// Cost at or above which the cost factor is zero
    pub cost_ceiling: f64,
    /// Number of alternates kept behind the primary
    pub max_alternates: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            weights: RoutingWeights::default(),
            cold_start_prior: 0.5,
            latency_ceiling_ms: 10_000.0,
            cost_ceiling: 0.1,
            max_alternates: 2,
        }
    }
}

impl RouterConfig {
    /// Set default weights
    #[must_use]
    pub fn with_weights(mut self, weights: RoutingWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Set the cold-start prior
    #[must_use]
    pub fn with_cold_start_prior(mut self, prior: f64) -> Self {
        self.cold_start_prior = prior;
        self
    }

    /// Set the latency ceiling
    #[must_use]
    pub fn with_latency_ceiling_ms(mut self, ceiling: f64) -> Self {
        self.latency_ceiling_ms = ceiling;
        self
    }

    /// Set the cost ceiling
    #[must_use]
    pub fn with_cost_ceiling(mut self, ceiling: f64) -> Self {
        self.cost_ceiling = ceiling;
        self
    }

    /// Set how many alternates to keep
    #[must_use]
    pub fn with_max_alternates(mut self, max_alternates: usize) -> Self {
        self.max_alternates = max_alternates;
        self
    }

    /// Validate weights, prior and ceilings
    pub fn validate(&self) -> Result<()> {
        self.weights.validate()?;
        if !(0.0..=1.0).contains(&self.cold_start_prior) {
            return Err(Error::InvalidWeights(format!(
                "cold_start_prior must be within 0..=1, got {}",
                self.cold_start_prior
            )));
        }
        if self.latency_ceiling_ms <= 0.0 || self.cost_ceiling <= 0.0 {
            return Err(Error::InvalidWeights(
                "latency and cost ceilings must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Score and rationale for one candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    /// Candidate skill
    pub skill_id: SkillId,
    /// Weighted score (0..=1)
    pub score: f64,
    /// How the score was obtained
    pub rationale: String,
}

/// Ranked outcome of routing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    /// Highest-scoring candidate
    pub primary: CandidateScore,
    /// Next best candidates, descending score
    pub alternates: Vec<CandidateScore>,
    /// Weights the decision was made with
    pub weights: RoutingWeights,
    /// Summary of the decision
    pub rationale: String,
}

impl RoutingDecision {
    /// Primary followed by alternates, the order attempts are made in
    pub fn attempt_order(&self) -> impl Iterator<Item = &CandidateScore> {
        std::iter::once(&self.primary).chain(self.alternates.iter())
    }
}

/// Pure candidate ranker
#[derive(Debug, Clone, Default)]
pub struct SkillRouter {
    config: RouterConfig,
}

impl SkillRouter {
    /// Create a router with default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a router with custom configuration
    #[must_use]
    pub fn with_config(config: RouterConfig) -> Self {
        Self { config }
    }

    /// Router configuration
    #[must_use]
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Rank candidates with the configured weights
    pub fn route(
        &self,
        candidates: &[SkillId],
        stats: &BenchmarkSnapshot,
    ) -> Result<RoutingDecision> {
        self.route_with_weights(candidates, stats, &self.config.weights)
    }

    /// Rank candidates with explicit weights
    #[instrument(skip(self, stats, weights), fields(candidates = candidates.len()))]
    pub fn route_with_weights(
        &self,
        candidates: &[SkillId],
        stats: &BenchmarkSnapshot,
        weights: &RoutingWeights,
    ) -> Result<RoutingDecision> {
        let mut scored: Vec<CandidateScore> = Vec::with_capacity(candidates.len());
        for skill_id in candidates {
            // The candidate set is ordered; a repeated id keeps its first position
            if scored.iter().any(|c| &c.skill_id == skill_id) {
                continue;
            }
            scored.push(self.score(skill_id, stats.get(skill_id), weights));
        }

        if scored.is_empty() {
            return Err(Error::NoCandidatesScored);
        }

        // Stable: equal scores keep candidate order
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));

        let mut ranked = scored.into_iter();
        let primary = ranked.next().ok_or(Error::NoCandidatesScored)?;
        let alternates: Vec<CandidateScore> = ranked.take(self.config.max_alternates).collect();

        let rationale = format!(
            "selected {} (score {:.4}) over {} alternate(s); weights success={} latency={} cost={}",
            primary.skill_id,
            primary.score,
            alternates.len(),
            weights.success,
            weights.latency,
            weights.cost
        );

        debug!(
            primary = %primary.skill_id,
            score = primary.score,
            alternates = alternates.len(),
            "Routing decision made"
        );

        Ok(RoutingDecision {
            primary,
            alternates,
            weights: *weights,
            rationale,
        })
    }

    fn score(
        &self,
        skill_id: &SkillId,
        stat: Option<&BenchmarkStat>,
        weights: &RoutingWeights,
    ) -> CandidateScore {
        let stat = match stat {
            Some(stat) if stat.sample_count > 0 => stat,
            _ => {
                return CandidateScore {
                    skill_id: skill_id.clone(),
                    score: self.config.cold_start_prior,
                    rationale: format!(
                        "no samples; cold-start prior {}",
                        self.config.cold_start_prior
                    ),
                };
            }
        };

        let success = unit(stat.success_rate);
        let latency = unit(1.0 - stat.p50_latency_ms / self.config.latency_ceiling_ms);
        let cost = unit(1.0 - stat.avg_cost / self.config.cost_ceiling);
        let score = weights.success * success + weights.latency * latency + weights.cost * cost;

        CandidateScore {
            skill_id: skill_id.clone(),
            score,
            rationale: format!(
                "success {:.3} x {} + latency {:.3} x {} + cost {:.3} x {} over {} samples",
                success,
                weights.success,
                latency,
                weights.latency,
                cost,
                weights.cost,
                stat.sample_count
            ),
        }
    }
}

/// Clamp to 0..=1, mapping NaN to 0
fn unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<SkillId> {
        raw.iter().map(|s| SkillId::from(*s)).collect()
    }

    #[test]
    fn test_weights_validation() {
        assert!(RoutingWeights::default().validate().is_ok());
        assert!(RoutingWeights::new(0.6, 0.3, 0.1).validate().is_ok());
        assert!(RoutingWeights::new(0.6, 0.3, 0.2).validate().is_err());
        assert!(RoutingWeights::new(1.2, -0.1, -0.1).validate().is_err());
    }

    #[test]
    fn test_weights_from_value() {
        let value = serde_json::json!({"success": 1.0, "latency": 0.0, "cost": 0.0});
        let weights = RoutingWeights::from_value(&value).unwrap();
        assert_eq!(weights.success, 1.0);
        assert!(RoutingWeights::from_value(&serde_json::json!({"success": "high"})).is_err());
    }

    #[test]
    fn test_score_formula() {
        let router = SkillRouter::new();
        let stats =
            BenchmarkSnapshot::new().with_stat(BenchmarkStat::new("A", 5000.0, 0.9, 0.05, 10));

        let decision = router.route(&ids(&["A"]), &stats).unwrap();
        // 0.5 * 0.9 + 0.3 * 0.5 + 0.2 * 0.5
        assert!((decision.primary.score - 0.7).abs() < 1e-9);
        assert!(decision.alternates.is_empty());
    }

    #[test]
    fn test_factors_saturate_at_ceiling() {
        let router = SkillRouter::new();
        let stats =
            BenchmarkSnapshot::new().with_stat(BenchmarkStat::new("SLOW", 60_000.0, 1.0, 5.0, 10));

        let decision = router.route(&ids(&["SLOW"]), &stats).unwrap();
        assert!((decision.primary.score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_cold_start_prior() {
        let router = SkillRouter::new();
        let stats = BenchmarkSnapshot::new()
            .with_stat(BenchmarkStat::new("GOOD", 100.0, 0.99, 0.001, 50))
            .with_stat(BenchmarkStat::new("NEW", 100.0, 0.99, 0.001, 0))
            .with_stat(BenchmarkStat::new("BAD", 9_900.0, 0.1, 0.09, 50));

        let decision = router.route(&ids(&["BAD", "NEW", "GOOD"]), &stats).unwrap();
        assert_eq!(decision.primary.skill_id.as_str(), "GOOD");
        assert_eq!(decision.alternates[0].skill_id.as_str(), "NEW");
        assert_eq!(decision.alternates[0].score, 0.5);
        assert_eq!(decision.alternates[1].skill_id.as_str(), "BAD");
    }

    #[test]
    fn test_missing_stat_uses_prior() {
        let router = SkillRouter::new();
        let decision = router.route(&ids(&["X"]), &BenchmarkSnapshot::new()).unwrap();
        assert_eq!(decision.primary.score, 0.5);
    }

    #[test]
    fn test_ties_keep_candidate_order() {
        let router = SkillRouter::new();
        let stats = BenchmarkSnapshot::new();

        let decision = router.route(&ids(&["B", "A", "C", "D"]), &stats).unwrap();
        assert_eq!(decision.primary.skill_id.as_str(), "B");
        let alternates: Vec<&str> = decision
            .alternates
            .iter()
            .map(|c| c.skill_id.as_str())
            .collect();
        assert_eq!(alternates, vec!["A", "C"]);
    }

    #[test]
    fn test_duplicate_candidates_not_self_alternate() {
        let router = SkillRouter::new();
        let decision = router
            .route(&ids(&["A", "A", "B"]), &BenchmarkSnapshot::new())
            .unwrap();
        assert_eq!(decision.primary.skill_id.as_str(), "A");
        assert!(decision
            .alternates
            .iter()
            .all(|c| c.skill_id != decision.primary.skill_id));
        assert_eq!(decision.alternates.len(), 1);
    }

    #[test]
    fn test_empty_candidates() {
        let router = SkillRouter::new();
        assert!(matches!(
            router.route(&[], &BenchmarkSnapshot::new()),
            Err(Error::NoCandidatesScored)
        ));
    }

    #[test]
    fn test_max_alternates() {
        let router = SkillRouter::with_config(RouterConfig::default().with_max_alternates(1));
        let decision = router
            .route(&ids(&["A", "B", "C"]), &BenchmarkSnapshot::new())
            .unwrap();
        assert_eq!(decision.alternates.len(), 1);
        assert_eq!(decision.attempt_order().count(), 2);
    }

    #[test]
    fn test_config_validation() {
        assert!(RouterConfig::default().validate().is_ok());
        assert!(RouterConfig::default()
            .with_cold_start_prior(1.5)
            .validate()
            .is_err());
        assert!(RouterConfig::default()
            .with_cost_ceiling(0.0)
            .validate()
            .is_err());
    }
}
