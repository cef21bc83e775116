//! Agent configuration — the TOML file the CLI loads at startup

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

use crate::skills::SkillDefinition;

/// Top-level agent configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Base URL peers use to reach this agent; derived from host/port when unset
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub streaming: bool,
    #[serde(default)]
    pub skills: Vec<SkillDefinition>,
    /// Peer agent name → base URL
    #[serde(default)]
    pub collaborators: HashMap<String, String>,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

/// Connection settings for the LLM-backed runtime
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default = "default_runtime_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// System instruction prepended to every invocation
    #[serde(default)]
    pub instruction: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            base_url: default_runtime_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            instruction: String::new(),
        }
    }
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_runtime_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

impl AgentConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = Self::parse(&content)?;
        info!(
            "Loaded config for agent '{}' ({} skills, {} collaborators)",
            config.name,
            config.skills.len(),
            config.collaborators.len()
        );
        Ok(config)
    }

    /// Parse configuration from a TOML string
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse agent config")
    }

    /// The base URL peers should use to reach this agent
    pub fn base_url(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!("http://{}:{}/", self.host, self.port),
        }
    }
}
