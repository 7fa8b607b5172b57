//! Planner - turns a task into an execution plan
//!
//! Plans are a pure function of the skill registry and the task type: every
//! enabled skill serving the task type becomes a candidate, in declaration
//! order. A plan currently holds a single step.

use crate::error::ErrorKind;
use crate::task::Task;
use conductor_skills::{SkillId, SkillRegistry, TaskType};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

/// One step of a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Position within the plan
    pub step_index: usize,
    /// Candidate skills, registry declaration order, no duplicates
    pub skill_candidates: Vec<SkillId>,
}

/// Ordered steps produced for one task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    /// Task type the plan was produced for
    pub task_type: TaskType,
    /// Steps in execution order
    pub steps: Vec<Step>,
}

impl ExecutionPlan {
    /// Candidates of the first step
    #[must_use]
    pub fn candidates(&self) -> &[SkillId] {
        self.steps
            .first()
            .map(|s| s.skill_candidates.as_slice())
            .unwrap_or(&[])
    }
}

/// Plan generator
#[derive(Debug, Clone)]
pub struct Planner {
    registry: Arc<SkillRegistry>,
}

impl Planner {
    /// Create a planner over a registry
    #[must_use]
    pub fn new(registry: Arc<SkillRegistry>) -> Self {
        Self { registry }
    }

    /// Produce a plan, or `UnknownTaskType` if no enabled skill matches
    #[instrument(skip(self, task), fields(task_id = %task.id, task_type = %task.task_type))]
    pub fn plan(&self, task: &Task) -> std::result::Result<ExecutionPlan, ErrorKind> {
        let candidates: Vec<SkillId> = self
            .registry
            .candidates_for(&task.task_type)
            .iter()
            .map(|s| s.id.clone())
            .collect();

        if candidates.is_empty() {
            debug!("No skills registered for task type");
            return Err(ErrorKind::UnknownTaskType);
        }

        debug!(candidates = candidates.len(), "Plan produced");
        Ok(ExecutionPlan {
            task_type: task.task_type.clone(),
            steps: vec![Step {
                step_index: 0,
                skill_candidates: candidates,
            }],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskSubmission;
    use conductor_skills::Skill;

    fn planner() -> Planner {
        let registry = SkillRegistry::new(vec![
            Skill::new("ENG-002", "ENG", "repo_reader"),
            Skill::new("OPS-001", "OPS", "calendar_api"),
            Skill::new("ENG-001", "ENG", "unit_test_runner"),
            Skill::new("LEGAL-001", "LEGAL", "pdf_parser").with_enabled(false),
        ])
        .unwrap();
        Planner::new(Arc::new(registry))
    }

    fn task(task_type: &str) -> Task {
        Task::accept(TaskSubmission::new(task_type, "do it").with_idempotency_key("k")).unwrap()
    }

    #[test]
    fn test_plan_lists_candidates_in_declaration_order() {
        let plan = planner().plan(&task("ENG")).unwrap();
        assert_eq!(plan.steps.len(), 1);
        assert_eq!(plan.steps[0].step_index, 0);
        let ids: Vec<&str> = plan.candidates().iter().map(|c| c.as_str()).collect();
        assert_eq!(ids, vec!["ENG-002", "ENG-001"]);
    }

    #[test]
    fn test_unknown_task_type() {
        assert_eq!(
            planner().plan(&task("FINANCE")),
            Err(ErrorKind::UnknownTaskType)
        );
    }

    #[test]
    fn test_only_disabled_skills_is_unknown() {
        assert_eq!(
            planner().plan(&task("LEGAL")),
            Err(ErrorKind::UnknownTaskType)
        );
    }
}
