//! Skill definitions
//!
//! A [`Skill`] binds a task type to one capability, together with its
//! approval requirement, declared cost and output contract. Skills are loaded
//! once and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique skill identifier (e.g. `ENG-001`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkillId(String);

impl SkillId {
    /// Create a skill id
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SkillId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SkillId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Task type a skill can serve (e.g. `ENG`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskType(String);

impl TaskType {
    /// Create a task type
    #[must_use]
    pub fn new(task_type: impl Into<String>) -> Self {
        Self(task_type.into())
    }

    /// Borrow the raw task type
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskType {
    fn from(task_type: &str) -> Self {
        Self::new(task_type)
    }
}

/// Domain-specific output rule checked by the validator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainRule {
    /// Outbound email must name a recipient address and a subject
    EmailRules,
    /// Side-effecting actions must report `status: success`
    ActionStatus,
    /// Flags absolute wording; informational only
    NeutralLanguage,
}

impl DomainRule {
    /// Check name as it appears in validation reports
    #[must_use]
    pub fn check_name(self) -> &'static str {
        match self {
            Self::EmailRules => "email_rules",
            Self::ActionStatus => "action_status",
            Self::NeutralLanguage => "neutral_language",
        }
    }
}

/// Thresholds for skills that produce executable test results
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TestRequirements {
    /// Minimum fraction of passing tests
    #[serde(default = "default_min_pass_ratio")]
    pub min_pass_ratio: f64,
    /// Minimum line coverage (0..=1)
    #[serde(default = "default_min_coverage")]
    pub min_coverage: f64,
}

fn default_min_pass_ratio() -> f64 {
    0.8
}

fn default_min_coverage() -> f64 {
    0.8
}

impl Default for TestRequirements {
    fn default() -> Self {
        Self {
            min_pass_ratio: default_min_pass_ratio(),
            min_coverage: default_min_coverage(),
        }
    }
}

/// What a skill promises about its output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputContract {
    /// JSON Schema the result payload must satisfy
    #[serde(default = "default_output_schema")]
    pub schema: serde_json::Value,
    /// Domain rules, checked in order
    #[serde(default)]
    pub rules: Vec<DomainRule>,
    /// Test requirements, present only for skills that run test suites
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tests: Option<TestRequirements>,
}

fn default_output_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "required": ["status"],
        "properties": {
            "status": {"type": "string"}
        }
    })
}

impl Default for OutputContract {
    fn default() -> Self {
        Self {
            schema: default_output_schema(),
            rules: Vec::new(),
            tests: None,
        }
    }
}

impl OutputContract {
    /// Replace the schema
    #[must_use]
    pub fn with_schema(mut self, schema: serde_json::Value) -> Self {
        self.schema = schema;
        self
    }

    /// Append a domain rule
    #[must_use]
    pub fn with_rule(mut self, rule: DomainRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Declare test requirements
    #[must_use]
    pub fn with_tests(mut self, tests: TestRequirements) -> Self {
        self.tests = Some(tests);
        self
    }
}

/// A registry entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    /// Unique id
    pub id: SkillId,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Human-readable description
    #[serde(default)]
    pub description: String,
    /// Task type this skill serves
    pub task_type: TaskType,
    /// Capability (tool name) invoked by this skill
    pub capability: String,
    /// Whether approver-mode tasks must be approved before execution
    #[serde(default)]
    pub requires_approval: bool,
    /// Declared cost per attempt
    #[serde(default)]
    pub cost_estimate: f64,
    /// Disabled skills are never planned
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Per-attempt deadline override in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    /// Declared output contract
    #[serde(default)]
    pub output_contract: OutputContract,
}

fn default_enabled() -> bool {
    true
}

impl Skill {
    /// Create an enabled skill with a default contract
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        task_type: impl Into<String>,
        capability: impl Into<String>,
    ) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id: SkillId::new(id),
            description: String::new(),
            task_type: TaskType::new(task_type),
            capability: capability.into(),
            requires_approval: false,
            cost_estimate: 0.0,
            enabled: true,
            timeout_ms: None,
            output_contract: OutputContract::default(),
        }
    }

    /// Set the display name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Require approval in approver mode
    #[must_use]
    pub fn with_requires_approval(mut self, requires_approval: bool) -> Self {
        self.requires_approval = requires_approval;
        self
    }

    /// Set the declared cost
    #[must_use]
    pub fn with_cost_estimate(mut self, cost_estimate: f64) -> Self {
        self.cost_estimate = cost_estimate;
        self
    }

    /// Enable or disable
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Override the per-attempt deadline
    #[must_use]
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    /// Set the output contract
    #[must_use]
    pub fn with_output_contract(mut self, contract: OutputContract) -> Self {
        self.output_contract = contract;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skill_from_yaml_defaults() {
        let yaml = r#"
id: ENG-001
task_type: ENG
capability: unit_test_runner
"#;
        let skill: Skill = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(skill.id.as_str(), "ENG-001");
        assert!(skill.enabled);
        assert!(!skill.requires_approval);
        assert!(skill.output_contract.rules.is_empty());
        assert!(skill.output_contract.tests.is_none());
        assert_eq!(skill.output_contract.schema["required"][0], "status");
    }

    #[test]
    fn test_contract_rules_parse_snake_case() {
        let yaml = r#"
rules: [email_rules, action_status]
tests:
  min_coverage: 0.7
"#;
        let contract: OutputContract = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            contract.rules,
            vec![DomainRule::EmailRules, DomainRule::ActionStatus]
        );
        let tests = contract.tests.unwrap();
        assert_eq!(tests.min_coverage, 0.7);
        assert_eq!(tests.min_pass_ratio, 0.8);
    }

    #[test]
    fn test_builder() {
        let skill = Skill::new("COM-001", "COM", "email_api")
            .with_name("Email Composer")
            .with_requires_approval(true)
            .with_cost_estimate(0.02)
            .with_timeout_ms(500);

        assert_eq!(skill.name, "Email Composer");
        assert!(skill.requires_approval);
        assert_eq!(skill.timeout_ms, Some(500));
        assert_eq!(skill.task_type, TaskType::from("COM"));
    }
}
