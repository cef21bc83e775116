//! Skill definitions and the registry an agent routes against
//!
//! Skills are declared capabilities a requester can select explicitly.
//! Registration order matters: the first-registered skill is the default
//! when a request names no skill.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Id of the implicit skill an agent falls back to when it has none declared
pub const GENERAL_SKILL_ID: &str = "general";

/// A declared agent capability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub examples: Vec<String>,
    /// Opaque schema hints, passed through to the agent card unvalidated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Value>,
}

impl SkillDefinition {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            tags: Vec::new(),
            examples: Vec::new(),
            input_schema: None,
            output_schema: None,
        }
    }

    /// The synthetic skill advertised by agents with an empty registry
    pub fn general(agent_name: &str) -> Self {
        Self {
            id: GENERAL_SKILL_ID.to_string(),
            name: "General Processing".to_string(),
            description: format!("{} capabilities", agent_name),
            tags: vec!["general".to_string()],
            examples: Vec::new(),
            input_schema: None,
            output_schema: None,
        }
    }
}

/// Insertion-ordered skill registry
///
/// Read-only once the agent starts serving traffic; populate it during
/// construction.
#[derive(Debug, Clone, Default)]
pub struct SkillRegistry {
    skills: Vec<SkillDefinition>,
}

impl SkillRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_skills(skills: Vec<SkillDefinition>) -> Self {
        let mut registry = Self::new();
        for skill in skills {
            registry.register(skill);
        }
        registry
    }

    /// Register a skill. Re-registering an id replaces the definition in
    /// place, keeping its original position.
    pub fn register(&mut self, skill: SkillDefinition) {
        debug!("Registering skill: {}", skill.id);
        if let Some(existing) = self.skills.iter_mut().find(|s| s.id == skill.id) {
            *existing = skill;
        } else {
            self.skills.push(skill);
        }
    }

    /// Look up a skill by id
    pub fn get(&self, id: &str) -> Option<&SkillDefinition> {
        self.skills.iter().find(|s| s.id == id)
    }

    /// The first-registered skill — the default route
    pub fn first(&self) -> Option<&SkillDefinition> {
        self.skills.first()
    }

    /// Iterate skills in registration order
    pub fn iter(&self) -> impl Iterator<Item = &SkillDefinition> {
        self.skills.iter()
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}
