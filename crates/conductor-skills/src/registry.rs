//! Skill registry
//!
//! The [`SkillRegistry`] is built once from a catalog and is immutable
//! afterwards. Declaration order is preserved: it is the order candidates are
//! planned in and the tie-breaker the router falls back on.
//!
//! # Catalog format
//!
//! ```yaml
//! skills:
//!   - id: ENG-001
//!     name: Unit Test Generator
//!     task_type: ENG
//!     capability: unit_test_runner
//!     cost_estimate: 0.08
//!     output_contract:
//!       tests: { min_pass_ratio: 0.8, min_coverage: 0.8 }
//! ```

use crate::error::{Error, Result};
use crate::skill::{Skill, SkillId, TaskType};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct SkillCatalog {
    #[serde(default)]
    skills: Vec<Skill>,
}

/// Immutable, ordered skill catalog
#[derive(Debug, Clone, Default)]
pub struct SkillRegistry {
    /// Skills in declaration order
    skills: Vec<Arc<Skill>>,
    /// Position of each skill in `skills`
    index: HashMap<SkillId, usize>,
}

impl SkillRegistry {
    /// Build a registry, rejecting duplicate ids
    pub fn new(skills: Vec<Skill>) -> Result<Self> {
        let mut index = HashMap::with_capacity(skills.len());
        let mut ordered = Vec::with_capacity(skills.len());

        for skill in skills {
            if index.contains_key(&skill.id) {
                return Err(Error::DuplicateSkill(skill.id.to_string()));
            }
            if !(skill.cost_estimate.is_finite() && skill.cost_estimate >= 0.0) {
                return Err(Error::Catalog(format!(
                    "skill {} has invalid cost_estimate {}",
                    skill.id, skill.cost_estimate
                )));
            }
            debug!(skill_id = %skill.id, task_type = %skill.task_type, "Registering skill");
            index.insert(skill.id.clone(), ordered.len());
            ordered.push(Arc::new(skill));
        }

        Ok(Self {
            skills: ordered,
            index,
        })
    }

    /// Parse a YAML catalog
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let catalog: SkillCatalog = serde_yaml::from_str(yaml)?;
        let registry = Self::new(catalog.skills)?;
        info!(skills = registry.len(), "Loaded skill catalog");
        Ok(registry)
    }

    /// Read and parse a YAML catalog file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&content)
    }

    /// Look up a skill by id
    #[must_use]
    pub fn get(&self, id: &SkillId) -> Option<Arc<Skill>> {
        self.index.get(id).map(|&i| self.skills[i].clone())
    }

    /// Look up a skill by id, failing if absent
    pub fn require(&self, id: &SkillId) -> Result<Arc<Skill>> {
        self.get(id)
            .ok_or_else(|| Error::SkillNotFound(id.to_string()))
    }

    /// Enabled skills serving `task_type`, in declaration order
    #[must_use]
    pub fn candidates_for(&self, task_type: &TaskType) -> Vec<Arc<Skill>> {
        self.skills
            .iter()
            .filter(|s| s.enabled && &s.task_type == task_type)
            .cloned()
            .collect()
    }

    /// Distinct task types, in order of first declaration
    #[must_use]
    pub fn task_types(&self) -> Vec<TaskType> {
        let mut seen = Vec::new();
        for skill in &self.skills {
            if !seen.contains(&skill.task_type) {
                seen.push(skill.task_type.clone());
            }
        }
        seen
    }

    /// All skills in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Skill>> {
        self.skills.iter()
    }

    /// Number of skills
    #[must_use]
    pub fn len(&self) -> usize {
        self.skills.len()
    }

    /// Check if the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}
