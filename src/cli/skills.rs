//! `conductor skills` - print the catalog

use crate::server::{load_benchmarks, load_config, load_skills};
use anyhow::{Context, Result};

pub fn run() -> Result<()> {
    let config = load_config().context("Failed to load configuration")?;
    let registry = load_skills(&config)?;
    let benchmarks = load_benchmarks(&config)?;

    println!(
        "{:<14} {:<10} {:<18} {:>8} {:>9} {:>9}  {}",
        "ID", "TYPE", "CAPABILITY", "COST", "APPROVAL", "SUCCESS", "NAME"
    );
    for skill in registry.iter() {
        let success = benchmarks
            .get(&skill.id)
            .map(|s| format!("{:.0}%", s.success_rate * 100.0))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<14} {:<10} {:<18} {:>8.3} {:>9} {:>9}  {}{}",
            skill.id.as_str(),
            skill.task_type.as_str(),
            skill.capability,
            skill.cost_estimate,
            if skill.requires_approval { "yes" } else { "no" },
            success,
            skill.name,
            if skill.enabled { "" } else { " (disabled)" },
        );
    }
    Ok(())
}
