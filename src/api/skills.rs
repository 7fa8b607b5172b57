//! Skill catalog REST API
//!
//! GET /api/v1/skills - List the registry in declaration order

use super::ApiResponse;
use axum::{extract::Extension, routing::get, Json, Router};
use conductor_core::Engine;
use conductor_skills::Skill;
use serde::Serialize;
use std::sync::Arc;

/// Skill info response
#[derive(Debug, Serialize)]
pub struct SkillInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub task_type: String,
    pub capability: String,
    pub requires_approval: bool,
    pub cost_estimate: f64,
    pub enabled: bool,
    /// Names of the domain rules in the output contract
    pub rules: Vec<&'static str>,
    pub runs_tests: bool,
}

impl From<&Skill> for SkillInfo {
    fn from(s: &Skill) -> Self {
        Self {
            id: s.id.to_string(),
            name: s.name.clone(),
            description: s.description.clone(),
            task_type: s.task_type.to_string(),
            capability: s.capability.clone(),
            requires_approval: s.requires_approval,
            cost_estimate: s.cost_estimate,
            enabled: s.enabled,
            rules: s.output_contract.rules.iter().map(|r| r.check_name()).collect(),
            runs_tests: s.output_contract.tests.is_some(),
        }
    }
}

async fn list_skills(
    Extension(engine): Extension<Arc<Engine>>,
) -> Json<ApiResponse<Vec<SkillInfo>>> {
    let skills = engine
        .registry()
        .iter()
        .map(|skill| SkillInfo::from(skill.as_ref()))
        .collect();
    Json(ApiResponse::success(skills))
}

/// Create skill routes
pub fn skills_routes() -> Router {
    Router::new().route("/api/v1/skills", get(list_skills))
}
