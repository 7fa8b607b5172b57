//! Configuration loading
//!
//! Handles loading configuration from embedded defaults, files, and environment.

use super::config::AppConfig;
use anyhow::{Context, Result};
use conductor_skills::{BenchmarkSnapshot, SkillRegistry};
use config::{Config, Environment, File, FileFormat};
use tracing::info;

/// Embedded default configuration (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../../config/default.toml");

/// Embedded skill catalog
pub const DEFAULT_SKILLS: &str = include_str!("../../config/skills.yaml");

/// Embedded initial benchmark snapshot
pub const DEFAULT_BENCHMARKS: &str = include_str!("../../config/benchmarks.yaml");

/// Load configuration from files and environment
pub fn load_config() -> Result<AppConfig> {
    let config = Config::builder()
        // 1. Embedded defaults (always available)
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
        // 2. External overrides (optional)
        .add_source(File::with_name("config/default").required(false))
        .add_source(
            File::with_name(&format!(
                "config/{}",
                std::env::var("CONDUCTOR_ENV").unwrap_or_else(|_| "development".to_string())
            ))
            .required(false),
        )
        .add_source(File::with_name("config/local").required(false))
        // 3. Environment variables (highest priority), e.g. CONDUCTOR_SERVER__PORT
        .add_source(
            Environment::with_prefix("CONDUCTOR")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    config
        .try_deserialize()
        .context("Failed to deserialize configuration")
}

/// Load the skill catalog from `catalog.skills_path` or the embedded copy
pub fn load_skills(config: &AppConfig) -> Result<SkillRegistry> {
    match &config.catalog.skills_path {
        Some(path) => {
            info!(path = %path, "Loading skill catalog");
            SkillRegistry::from_yaml_file(path)
                .with_context(|| format!("Failed to load skill catalog from {}", path))
        }
        None => SkillRegistry::from_yaml_str(DEFAULT_SKILLS)
            .context("Failed to parse embedded skill catalog"),
    }
}

/// Load the initial benchmark snapshot
pub fn load_benchmarks(config: &AppConfig) -> Result<BenchmarkSnapshot> {
    match &config.catalog.benchmarks_path {
        Some(path) => {
            info!(path = %path, "Loading benchmark snapshot");
            BenchmarkSnapshot::from_yaml_file(path)
                .with_context(|| format!("Failed to load benchmarks from {}", path))
        }
        None => BenchmarkSnapshot::from_yaml_str(DEFAULT_BENCHMARKS)
            .context("Failed to parse embedded benchmarks"),
    }
}
