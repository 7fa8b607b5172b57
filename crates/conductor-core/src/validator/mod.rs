//! Validator - checks an execution outcome against the skill's contract
//!
//! The battery runs in a fixed order:
//!
//! | # | Check | Runs when |
//! |---|-------|-----------|
//! | 1 | `output_schema` | always |
//! | 2 | `artifact_references` | always |
//! | 3 | declared domain rules (`email_rules`, `action_status`, `neutral_language`) | declared |
//! | 4 | `test_execution` | contract declares test requirements |
//! | 5 | `coverage` | contract declares test requirements |
//!
//! Checks are independent and run concurrently; the report keeps battery
//! order and `aggregate_passed` is the AND of every check.

mod checks;


use crate::executor::ExecutionOutcome;
use conductor_skills::{DomainRule, Skill};
use futures::future::{join_all, BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

/// Words flagged by the `neutral_language` rule
const DEFAULT_FLAGGED_WORDS: &[&str] = &["always", "never", "definitely", "impossible"];

/// Result of one check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Check name
    pub name: String,
    /// Whether the check passed
    pub passed: bool,
    /// Human-readable detail
    pub detail: String,
}

impl CheckResult {
    /// Passing check
    #[must_use]
    pub fn pass(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            detail: detail.into(),
        }
    }

    /// Failing check
    #[must_use]
    pub fn fail(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: false,
            detail: detail.into(),
        }
    }
}

/// Ordered check results plus the aggregate verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Results in battery order
    pub checks: Vec<CheckResult>,
    /// AND of all checks
    pub aggregate_passed: bool,
}

impl ValidationReport {
    /// Build a report from ordered results
    #[must_use]
    pub fn from_checks(checks: Vec<CheckResult>) -> Self {
        let aggregate_passed = checks.iter().all(|c| c.passed);
        Self {
            checks,
            aggregate_passed,
        }
    }

    /// Report for a battery that did not finish in time
    #[must_use]
    pub fn deadline_exceeded(timeout: Duration) -> Self {
        Self::from_checks(vec![CheckResult::fail(
            "validation_deadline",
            format!("validation did not complete within {}ms", timeout.as_millis()),
        )])
    }

    /// Names of failed checks
    #[must_use]
    pub fn failed_checks(&self) -> Vec<&str> {
        self.checks
            .iter()
            .filter(|c| !c.passed)
            .map(|c| c.name.as_str())
            .collect()
    }
}

/// Validation seam used by the engine
#[async_trait::async_trait]
pub trait OutputValidator: Send + Sync {
    /// Check a successful outcome; never fails, failures are in the report
    async fn validate(&self, outcome: &ExecutionOutcome, skill: &Skill) -> ValidationReport;
}

/// Runs the check battery
#[derive(Debug, Clone)]
pub struct Validator {
    flagged_words: Vec<String>,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator {
    /// Create a validator with the default flagged-word list
    #[must_use]
    pub fn new() -> Self {
        Self {
            flagged_words: DEFAULT_FLAGGED_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }

    /// Replace the words flagged by `neutral_language`
    #[must_use]
    pub fn with_flagged_words(mut self, words: Vec<String>) -> Self {
        self.flagged_words = words.into_iter().map(|w| w.to_lowercase()).collect();
        self
    }

    /// Validate a successful outcome against the skill's output contract
    #[instrument(skip(self, outcome, skill), fields(skill_id = %skill.id))]
    pub async fn validate(&self, outcome: &ExecutionOutcome, skill: &Skill) -> ValidationReport {
        let contract = &skill.output_contract;
        let payload = &outcome.result;

        let mut battery: Vec<BoxFuture<'_, CheckResult>> = vec![
            async move { checks::output_schema(payload, &contract.schema) }.boxed(),
            async move { checks::artifact_references(&outcome.artifacts) }.boxed(),
        ];

        for rule in &contract.rules {
            let check = match rule {
                DomainRule::EmailRules => async move { checks::email_rules(payload) }.boxed(),
                DomainRule::ActionStatus => async move { checks::action_status(payload) }.boxed(),
                DomainRule::NeutralLanguage => {
                    let words = &self.flagged_words;
                    async move { checks::neutral_language(payload, words) }.boxed()
                }
            };
            battery.push(check);
        }

        if let Some(requirements) = &contract.tests {
            battery.push(async move { checks::test_execution(payload, requirements) }.boxed());
            battery.push(async move { checks::coverage(payload, requirements) }.boxed());
        }

        let report = ValidationReport::from_checks(join_all(battery).await);
        debug!(
            checks = report.checks.len(),
            passed = report.aggregate_passed,
            "Validation finished"
        );
        report
    }
}

#[async_trait::async_trait]
impl OutputValidator for Validator {
    async fn validate(&self, outcome: &ExecutionOutcome, skill: &Skill) -> ValidationReport {
        Validator::validate(self, outcome, skill).await
    }
}
