//! Individual validation checks
//!
//! Each check is a pure function of the payload and the contract. A check
//! that cannot run because its input is missing fails with a detail saying
//! what was missing.

use super::CheckResult;
use conductor_skills::TestRequirements;
use serde_json::Value;

/// Look up a field on the payload itself or in its `metadata` object
fn field<'a>(payload: &'a Value, name: &str) -> Option<&'a Value> {
    payload
        .get(name)
        .or_else(|| payload.get("metadata").and_then(|m| m.get(name)))
}

pub(super) fn output_schema(payload: &Value, schema: &Value) -> CheckResult {
    const NAME: &str = "output_schema";

    let compiled = match jsonschema::JSONSchema::compile(schema) {
        Ok(compiled) => compiled,
        Err(e) => return CheckResult::fail(NAME, format!("declared schema is invalid: {}", e)),
    };

    let errors: Vec<String> = match compiled.validate(payload) {
        Ok(()) => Vec::new(),
        Err(errors) => errors.map(|e| format!("{} at {}", e, e.instance_path)).collect(),
    };

    if errors.is_empty() {
        CheckResult::pass(NAME, "payload conforms to declared schema")
    } else {
        CheckResult::fail(NAME, errors.join("; "))
    }
}

pub(super) fn artifact_references(artifacts: &[String]) -> CheckResult {
    const NAME: &str = "artifact_references";

    if artifacts.is_empty() {
        return CheckResult::pass(NAME, "no artifacts produced");
    }

    let malformed: Vec<&str> = artifacts
        .iter()
        .filter(|uri| match url::Url::parse(uri) {
            Ok(parsed) => parsed.cannot_be_a_base(),
            Err(_) => true,
        })
        .map(String::as_str)
        .collect();

    if malformed.is_empty() {
        CheckResult::pass(NAME, format!("{} artifact reference(s) well-formed", artifacts.len()))
    } else {
        CheckResult::fail(
            NAME,
            format!("malformed artifact reference(s): {}", malformed.join(", ")),
        )
    }
}

pub(super) fn email_rules(payload: &Value) -> CheckResult {
    const NAME: &str = "email_rules";

    let to = field(payload, "to").and_then(Value::as_str).unwrap_or("");
    let subject = field(payload, "subject").and_then(Value::as_str).unwrap_or("");

    let mut problems = Vec::new();
    if to.is_empty() {
        problems.push("missing recipient");
    } else if !to.contains('@') {
        problems.push("recipient is not an email address");
    }
    if subject.trim().is_empty() {
        problems.push("missing subject");
    }

    if problems.is_empty() {
        CheckResult::pass(NAME, format!("email to {} is well-formed", to))
    } else {
        CheckResult::fail(NAME, problems.join("; "))
    }
}

pub(super) fn action_status(payload: &Value) -> CheckResult {
    const NAME: &str = "action_status";

    match payload.get("status").and_then(Value::as_str) {
        Some("success") => CheckResult::pass(NAME, "action reported success"),
        Some(other) => CheckResult::fail(NAME, format!("action reported status '{}'", other)),
        None => CheckResult::fail(NAME, "action reported no status"),
    }
}

pub(super) fn neutral_language(payload: &Value, flagged_words: &[String]) -> CheckResult {
    const NAME: &str = "neutral_language";

    let text = payload.to_string().to_lowercase();
    let words: Vec<&str> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    let mut found: Vec<&str> = flagged_words
        .iter()
        .map(String::as_str)
        .filter(|flagged| words.contains(flagged))
        .collect();
    found.dedup();

    if found.is_empty() {
        CheckResult::pass(NAME, "no absolute language found")
    } else {
        CheckResult::pass(NAME, format!("flagged absolute language: {}", found.join(", ")))
    }
}

pub(super) fn test_execution(payload: &Value, requirements: &TestRequirements) -> CheckResult {
    const NAME: &str = "test_execution";

    let passed = field(payload, "passed").and_then(Value::as_u64);
    let failed = field(payload, "failed").and_then(Value::as_u64);
    let (passed, failed) = match (passed, failed) {
        (Some(p), Some(f)) => (p, f),
        _ => return CheckResult::fail(NAME, "no test results produced"),
    };

    let total = passed + failed;
    if total == 0 {
        return CheckResult::fail(NAME, "no tests were executed");
    }

    let allowed = (1.0 - requirements.min_pass_ratio) * total as f64;
    let detail = format!(
        "{}/{} passed (at most {:.1} failures allowed)",
        passed, total, allowed
    );
    if failed as f64 <= allowed {
        CheckResult::pass(NAME, detail)
    } else {
        CheckResult::fail(NAME, detail)
    }
}

pub(super) fn coverage(payload: &Value, requirements: &TestRequirements) -> CheckResult {
    const NAME: &str = "coverage";

    let Some(coverage) = field(payload, "coverage").and_then(Value::as_f64) else {
        return CheckResult::fail(NAME, "no coverage data produced");
    };

    let detail = format!(
        "coverage {:.2} (minimum {:.2})",
        coverage, requirements.min_coverage
    );
    if coverage >= requirements.min_coverage {
        CheckResult::pass(NAME, detail)
    } else {
        CheckResult::fail(NAME, detail)
    }
}
