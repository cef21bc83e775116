//! Skill routing — pick the skill that should handle a request

use tracing::debug;

use confab_core::skills::{SkillDefinition, SkillRegistry};

use crate::protocol::AgentRequest;

/// Resolve the skill for a request.
///
/// An explicitly requested skill wins when it exists. Unknown or absent
/// skill ids fall back to the first-registered skill; an empty registry
/// yields `None` and the caller runs the implicit `general` skill.
pub fn route_skill<'a>(
    request: &AgentRequest,
    registry: &'a SkillRegistry,
) -> Option<&'a SkillDefinition> {
    if let Some(id) = &request.skill_id {
        if let Some(skill) = registry.get(id) {
            return Some(skill);
        }
        debug!("Unknown skill id '{}', falling back to default", id);
    }
    registry.first()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> SkillRegistry {
        SkillRegistry::from_skills(vec![
            SkillDefinition::new("haiku", "Haiku Writing", "Writes haiku"),
            SkillDefinition::new("sonnet", "Sonnet Writing", "Writes sonnets"),
        ])
    }

    fn request_for(skill_id: Option<&str>) -> AgentRequest {
        AgentRequest {
            skill_id: skill_id.map(|s| s.to_string()),
            ..AgentRequest::new("write something")
        }
    }

    #[test]
    fn test_explicit_skill_selected() {
        let registry = registry();
        let skill = route_skill(&request_for(Some("sonnet")), &registry).unwrap();
        assert_eq!(skill.id, "sonnet");
    }

    #[test]
    fn test_no_skill_id_routes_to_first() {
        let registry = registry();
        let skill = route_skill(&request_for(None), &registry).unwrap();
        assert_eq!(skill.id, "haiku");
    }

    #[test]
    fn test_unknown_skill_id_falls_back_to_first() {
        let registry = registry();
        let skill = route_skill(&request_for(Some("limerick")), &registry).unwrap();
        assert_eq!(skill.id, "haiku");
    }

    #[test]
    fn test_empty_registry_yields_none() {
        let registry = SkillRegistry::new();
        assert!(route_skill(&request_for(None), &registry).is_none());
        assert!(route_skill(&request_for(Some("haiku")), &registry).is_none());
    }
}
