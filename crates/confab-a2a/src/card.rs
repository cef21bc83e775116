//! Agent card construction — the discovery document an agent publishes

use confab_core::skills::{SkillDefinition, SkillRegistry};

use crate::protocol::{AgentCapabilities, AgentCard};

const TEXT_PLAIN: &str = "text/plain";
const APPLICATION_JSON: &str = "application/json";

/// Build the agent card from identity and the current skill registry.
///
/// Pure and side-effect-free; call it again whenever the registry changes.
/// An empty registry still advertises one synthetic `general` skill so
/// peers always see at least one capability.
pub fn build_agent_card(
    name: &str,
    description: &str,
    version: &str,
    url: &str,
    streaming: bool,
    registry: &SkillRegistry,
) -> AgentCard {
    let skills = if registry.is_empty() {
        vec![SkillDefinition::general(name)]
    } else {
        registry.iter().cloned().collect()
    };

    AgentCard {
        name: name.to_string(),
        description: description.to_string(),
        version: version.to_string(),
        url: url.to_string(),
        capabilities: AgentCapabilities {
            streaming,
            push_notifications: false,
            state_transition_history: true,
        },
        default_input_modes: vec![TEXT_PLAIN.to_string(), APPLICATION_JSON.to_string()],
        default_output_modes: vec![TEXT_PLAIN.to_string(), APPLICATION_JSON.to_string()],
        skills,
    }
}
