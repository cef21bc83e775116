//! confab-core — shared building blocks for Confab agents
//!
//! Holds the pieces every agent needs regardless of transport: the
//! `AgentRuntime` trait the protocol adapter drives, the skill registry it
//! routes against, and the TOML configuration the CLI loads at startup.

pub mod config;
pub mod llm;
pub mod runtime;
pub mod skills;

pub use config::{AgentConfig, RuntimeConfig};
pub use llm::LlmRuntime;
pub use runtime::{AgentRuntime, RuntimeEvent};
pub use skills::{GENERAL_SKILL_ID, SkillDefinition, SkillRegistry};
