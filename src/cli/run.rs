//! `conductor run` - one task through an in-process engine

use crate::server::{build_engine, load_config};
use anyhow::{bail, Context, Result};
use clap::Args;
use conductor_core::{AutonomyMode, TaskStatus, TaskSubmission};
use tracing::info;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Task type (e.g. ENG, COM)
    #[arg(long)]
    pub task_type: String,
    /// Free-text task description
    #[arg(long, default_value = "")]
    pub description: String,
    /// Idempotency key (a fresh one is generated when omitted)
    #[arg(long)]
    pub key: Option<String>,
    /// Pause before skills that require approval
    #[arg(long)]
    pub approver: bool,
    /// Approve immediately if the task pauses
    #[arg(long, requires = "approver")]
    pub approve: bool,
    /// Context parameter as key=value; values are parsed as JSON when possible
    #[arg(long = "context", value_name = "KEY=VALUE")]
    pub context: Vec<String>,
}

/// Split `key=value`, parsing the value as JSON and falling back to a string
fn parse_context(pair: &str) -> Result<(String, serde_json::Value)> {
    let Some((key, value)) = pair.split_once('=') else {
        bail!("context must be KEY=VALUE, got '{}'", pair);
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("context key must not be empty");
    }
    let value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

pub async fn run(args: RunArgs) -> Result<()> {
    let config = load_config().context("Failed to load configuration")?;
    let runtime = build_engine(&config).await?;

    let key = args
        .key
        .unwrap_or_else(|| format!("cli-{}", uuid::Uuid::new_v4()));
    let mode = if args.approver {
        AutonomyMode::Approver
    } else {
        AutonomyMode::Collaborator
    };

    let mut submission = TaskSubmission::new(args.task_type, args.description)
        .with_idempotency_key(key)
        .with_autonomy_mode(mode);
    for pair in &args.context {
        let (k, v) = parse_context(pair)?;
        submission = submission.with_context(k, v);
    }

    let mut result = runtime.engine.submit(submission).await?;
    if result.status == TaskStatus::AwaitingApproval && args.approve {
        info!(task_id = %result.task_id, "Approving from the command line");
        result = runtime.engine.approve(result.task_id).await?;
    }

    println!(
        "{}",
        serde_json::to_string_pretty(&result).context("Failed to render result")?
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_context_json_value() {
        let (k, v) = parse_context("coverage=0.9").unwrap();
        assert_eq!(k, "coverage");
        assert_eq!(v, serde_json::json!(0.9));
    }

    #[test]
    fn test_parse_context_string_value() {
        let (_, v) = parse_context("to=ops@example.com").unwrap();
        assert_eq!(v, serde_json::json!("ops@example.com"));
    }

    #[test]
    fn test_parse_context_rejects_missing_equals() {
        assert!(parse_context("coverage").is_err());
        assert!(parse_context("=1").is_err());
    }
}
