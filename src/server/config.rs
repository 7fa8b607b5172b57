//! Server configuration types
//!
//! Contains all configuration structures for the Conductor server. Every
//! section has defaults, so a partial TOML file or a handful of
//! `CONDUCTOR_*` variables is enough.

use conductor_core::EngineConfig;
use conductor_skills::{RouterConfig, RoutingWeights};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub engine: EngineAppConfig,
    #[serde(default)]
    pub routing: RoutingAppConfig,
    #[serde(default)]
    pub idempotency: IdempotencyConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

impl AppConfig {
    /// Engine configuration derived from the `engine` and `routing` sections
    pub fn engine_config(&self) -> EngineConfig {
        let router = RouterConfig::default()
            .with_weights(RoutingWeights::new(
                self.routing.weights.success,
                self.routing.weights.latency,
                self.routing.weights.cost,
            ))
            .with_cold_start_prior(self.routing.cold_start_prior)
            .with_latency_ceiling_ms(self.routing.latency_ceiling_ms)
            .with_cost_ceiling(self.routing.cost_ceiling)
            .with_max_alternates(self.engine.max_alternates);

        EngineConfig::default()
            .with_router(router)
            .with_attempt_timeout(Duration::from_millis(self.engine.attempt_timeout_ms))
            .with_validation_timeout(Duration::from_millis(self.engine.validation_timeout_ms))
            .with_replay_poll_interval(Duration::from_millis(self.engine.replay_poll_interval_ms))
            .with_replay_wait_timeout(Duration::from_millis(self.engine.replay_wait_timeout_ms))
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8090
}

/// Engine deadlines and fallback depth
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineAppConfig {
    /// Per-attempt deadline, unless the skill sets `timeout_ms`
    #[serde(default = "default_attempt_timeout_ms")]
    pub attempt_timeout_ms: u64,
    /// Deadline for the validator battery
    #[serde(default = "default_validation_timeout_ms")]
    pub validation_timeout_ms: u64,
    /// How often a duplicate submission polls for the first one's result
    #[serde(default = "default_replay_poll_interval_ms")]
    pub replay_poll_interval_ms: u64,
    /// How long a duplicate submission waits before giving up
    #[serde(default = "default_replay_wait_timeout_ms")]
    pub replay_wait_timeout_ms: u64,
    /// Alternates kept behind the primary
    #[serde(default = "default_max_alternates")]
    pub max_alternates: usize,
}

impl Default for EngineAppConfig {
    fn default() -> Self {
        Self {
            attempt_timeout_ms: default_attempt_timeout_ms(),
            validation_timeout_ms: default_validation_timeout_ms(),
            replay_poll_interval_ms: default_replay_poll_interval_ms(),
            replay_wait_timeout_ms: default_replay_wait_timeout_ms(),
            max_alternates: default_max_alternates(),
        }
    }
}

fn default_attempt_timeout_ms() -> u64 {
    30_000
}
fn default_validation_timeout_ms() -> u64 {
    5_000
}
fn default_replay_poll_interval_ms() -> u64 {
    50
}
fn default_replay_wait_timeout_ms() -> u64 {
    120_000
}
fn default_max_alternates() -> usize {
    2
}

/// Router scoring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingAppConfig {
    #[serde(default)]
    pub weights: WeightsConfig,
    #[serde(default = "default_cold_start_prior")]
    pub cold_start_prior: f64,
    #[serde(default = "default_latency_ceiling_ms")]
    pub latency_ceiling_ms: f64,
    #[serde(default = "default_cost_ceiling")]
    pub cost_ceiling: f64,
}

impl Default for RoutingAppConfig {
    fn default() -> Self {
        Self {
            weights: WeightsConfig::default(),
            cold_start_prior: default_cold_start_prior(),
            latency_ceiling_ms: default_latency_ceiling_ms(),
            cost_ceiling: default_cost_ceiling(),
        }
    }
}

fn default_cold_start_prior() -> f64 {
    0.5
}
fn default_latency_ceiling_ms() -> f64 {
    10_000.0
}
fn default_cost_ceiling() -> f64 {
    0.1
}

/// Scoring weights; must sum to 1.0
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightsConfig {
    pub success: f64,
    pub latency: f64,
    pub cost: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        let weights = RoutingWeights::default();
        Self {
            success: weights.success,
            latency: weights.latency,
            cost: weights.cost,
        }
    }
}

/// Idempotency backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdempotencyBackend {
    #[default]
    Memory,
    Redis,
}

/// Idempotency store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdempotencyConfig {
    #[serde(default)]
    pub backend: IdempotencyBackend,
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// Stored result lifetime; 0 keeps results forever
    #[serde(default)]
    pub result_ttl_secs: u64,
}

impl Default for IdempotencyConfig {
    fn default() -> Self {
        Self {
            backend: IdempotencyBackend::default(),
            redis_url: default_redis_url(),
            key_prefix: default_key_prefix(),
            result_ttl_secs: 0,
        }
    }
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}
fn default_key_prefix() -> String {
    "conductor:idem:".to_string()
}

/// Skill and benchmark catalog locations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Skill catalog YAML; the embedded catalog is used when unset
    #[serde(default)]
    pub skills_path: Option<String>,
    /// Benchmark YAML; the embedded snapshot is used when unset
    #[serde(default)]
    pub benchmarks_path: Option<String>,
}
