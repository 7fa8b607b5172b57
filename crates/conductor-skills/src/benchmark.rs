//! Benchmark statistics
//!
//! Per-skill rolling metrics are produced outside the engine. The router only
//! ever sees one [`BenchmarkSnapshot`] per decision; [`SharedBenchmarks`]
//! lets a collaborator swap in a fresh snapshot without disturbing decisions
//! already in flight.

use crate::error::{Error, Result};
use crate::skill::SkillId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Rolling metrics for one skill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkStat {
    /// Skill the figures belong to
    pub skill_id: SkillId,
    /// Median latency in milliseconds
    pub p50_latency_ms: f64,
    /// Fraction of successful runs (0..=1)
    pub success_rate: f64,
    /// Average cost per run
    pub avg_cost: f64,
    /// Number of runs the figures are based on
    #[serde(default)]
    pub sample_count: u64,
    /// When the figures were last refreshed
    #[serde(default = "Utc::now")]
    pub last_updated: DateTime<Utc>,
}

impl BenchmarkStat {
    /// Create a stat with the given figures
    #[must_use]
    pub fn new(
        skill_id: impl Into<String>,
        p50_latency_ms: f64,
        success_rate: f64,
        avg_cost: f64,
        sample_count: u64,
    ) -> Self {
        Self {
            skill_id: SkillId::new(skill_id),
            p50_latency_ms,
            success_rate,
            avg_cost,
            sample_count,
            last_updated: Utc::now(),
        }
    }

    /// Reject figures the router cannot score
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| Error::InvalidBenchmark {
            skill_id: self.skill_id.to_string(),
            reason: reason.to_string(),
        };
        if !(0.0..=1.0).contains(&self.success_rate) {
            return Err(invalid("success_rate must be within 0..=1"));
        }
        if !self.p50_latency_ms.is_finite() || self.p50_latency_ms < 0.0 {
            return Err(invalid("p50_latency_ms must be a non-negative number"));
        }
        if !self.avg_cost.is_finite() || self.avg_cost < 0.0 {
            return Err(invalid("avg_cost must be a non-negative number"));
        }
        Ok(())
    }

    /// Successful runs per second of median latency
    fn throughput(&self) -> f64 {
        self.success_rate * 1000.0 / self.p50_latency_ms.max(1.0)
    }
}

#[derive(Debug, Deserialize)]
struct BenchmarkCatalog {
    #[serde(default)]
    benchmarks: Vec<BenchmarkStat>,
}

/// Read-only map of skill id to stat
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BenchmarkSnapshot {
    stats: HashMap<SkillId, BenchmarkStat>,
}

impl BenchmarkSnapshot {
    /// Create an empty snapshot
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot; later entries for the same skill win
    #[must_use]
    pub fn from_stats(stats: impl IntoIterator<Item = BenchmarkStat>) -> Self {
        Self {
            stats: stats
                .into_iter()
                .map(|s| (s.skill_id.clone(), s))
                .collect(),
        }
    }

    /// Build a snapshot, rejecting out-of-range figures
    pub fn try_from_stats(stats: impl IntoIterator<Item = BenchmarkStat>) -> Result<Self> {
        let stats: Vec<BenchmarkStat> = stats.into_iter().collect();
        for stat in &stats {
            stat.validate()?;
        }
        Ok(Self::from_stats(stats))
    }

    /// Parse a YAML benchmark catalog (`benchmarks: [...]`)
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let catalog: BenchmarkCatalog = serde_yaml::from_str(yaml)?;
        let snapshot = Self::from_stats(catalog.benchmarks);
        info!(skills = snapshot.len(), "Loaded benchmark catalog");
        Ok(snapshot)
    }

    /// Read and parse a YAML benchmark catalog file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&content)
    }

    /// Add or replace a stat
    #[must_use]
    pub fn with_stat(mut self, stat: BenchmarkStat) -> Self {
        self.stats.insert(stat.skill_id.clone(), stat);
        self
    }

    /// Stat for a skill
    #[must_use]
    pub fn get(&self, skill_id: &SkillId) -> Option<&BenchmarkStat> {
        self.stats.get(skill_id)
    }

    /// Number of skills with figures
    #[must_use]
    pub fn len(&self) -> usize {
        self.stats.len()
    }

    /// Check if the snapshot is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    /// Stats in no particular order
    pub fn iter(&self) -> impl Iterator<Item = &BenchmarkStat> {
        self.stats.values()
    }

    /// Best `limit` skills by success rate over median latency, ties by id
    #[must_use]
    pub fn leaderboard(&self, limit: usize) -> Vec<&BenchmarkStat> {
        let mut ranked: Vec<&BenchmarkStat> = self.stats.values().collect();
        ranked.sort_by(|a, b| {
            b.throughput()
                .total_cmp(&a.throughput())
                .then_with(|| a.skill_id.as_str().cmp(b.skill_id.as_str()))
        });
        ranked.truncate(limit);
        ranked
    }
}

/// Source of the snapshot used for one routing decision
#[async_trait::async_trait]
pub trait BenchmarkSource: Send + Sync {
    /// Current snapshot
    async fn snapshot(&self) -> Arc<BenchmarkSnapshot>;
}

/// Refreshable snapshot holder
#[derive(Debug, Clone, Default)]
pub struct SharedBenchmarks {
    current: Arc<RwLock<Arc<BenchmarkSnapshot>>>,
}

impl SharedBenchmarks {
    /// Wrap an initial snapshot
    #[must_use]
    pub fn new(snapshot: BenchmarkSnapshot) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(snapshot))),
        }
    }

    /// Swap in a fresh snapshot
    pub async fn replace(&self, snapshot: BenchmarkSnapshot) {
        let skills = snapshot.len();
        *self.current.write().await = Arc::new(snapshot);
        info!(skills, "Benchmark snapshot replaced");
    }
}

#[async_trait::async_trait]
impl BenchmarkSource for SharedBenchmarks {
    async fn snapshot(&self) -> Arc<BenchmarkSnapshot> {
        self.current.read().await.clone()
    }
}
