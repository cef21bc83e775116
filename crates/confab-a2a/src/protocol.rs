//! A2A protocol wire types
//!
//! Messages carry parts (text or structured data), tasks carry artifacts,
//! and the agent card advertises identity and skills for discovery.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use confab_core::skills::SkillDefinition;

/// Context key a requester may set to select a skill explicitly
pub const SKILL_ID_KEY: &str = "skill_id";

/// Agent card — advertised at /.well-known/agent.json
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentCard {
    pub name: String,
    pub description: String,
    pub version: String,
    pub url: String,
    pub capabilities: AgentCapabilities,
    pub default_input_modes: Vec<String>,
    pub default_output_modes: Vec<String>,
    pub skills: Vec<SkillDefinition>,
}

/// Capability flags in the agent card
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AgentCapabilities {
    pub streaming: bool,
    pub push_notifications: bool,
    pub state_transition_history: bool,
}

/// One part of a message or artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Part {
    Text { text: String },
    Data { data: Map<String, Value> },
}

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
}

/// A protocol message: one text part plus optional data parts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub message_id: String,
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Message {
    /// Build a user message with a single text part
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            message_id: Uuid::new_v4().to_string(),
            role: Role::User,
            parts: vec![Part::Text { text: text.into() }],
        }
    }
}

/// A piece of task output attached at completion or failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub artifact_id: String,
    pub name: String,
    pub parts: Vec<Part>,
}

impl Artifact {
    pub fn text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            artifact_id: Uuid::new_v4().to_string(),
            name: name.into(),
            parts: vec![Part::Text { text: text.into() }],
        }
    }

    pub fn data(name: impl Into<String>, data: Map<String, Value>) -> Self {
        Self {
            artifact_id: Uuid::new_v4().to_string(),
            name: name.into(),
            parts: vec![Part::Data { data }],
        }
    }
}

/// Task lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Submitted,
    Working,
    Completed,
    Failed,
    Canceled,
}

impl TaskState {
    /// Terminal states admit no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Canceled)
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Submitted => write!(f, "submitted"),
            Self::Working => write!(f, "working"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::Canceled => write!(f, "canceled"),
        }
    }
}

/// Current status of a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStatus {
    pub state: TaskState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// One request/response lifecycle instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub context_id: String,
    pub status: TaskStatus,
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
}

/// Inbound task submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub message: Message,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,
}

/// Error body returned by the HTTP transport
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// The request shape the processor works with, decoded from a message
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentRequest {
    pub message: String,
    #[serde(default)]
    pub context: Map<String, Value>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub skill_id: Option<String>,
}

impl AgentRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    /// Decode a protocol message: text parts concatenate into the request
    /// message, data parts merge into the context, and a `skill_id` context
    /// key selects a skill.
    pub fn from_message(message: &Message) -> Self {
        let mut text = String::new();
        let mut context = Map::new();

        for part in &message.parts {
            match part {
                Part::Text { text: t } => {
                    if !text.is_empty() {
                        text.push('\n');
                    }
                    text.push_str(t);
                }
                Part::Data { data } => {
                    for (k, v) in data {
                        context.insert(k.clone(), v.clone());
                    }
                }
            }
        }

        let skill_id = context
            .get(SKILL_ID_KEY)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());

        Self {
            message: text,
            context,
            session_id: None,
            skill_id,
        }
    }
}

/// Status of an agent response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// The response shape the processor produces
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResponse {
    pub message: String,
    pub status: ResponseStatus,
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub skill_used: Option<String>,
}

impl AgentResponse {
    pub fn success(
        message: impl Into<String>,
        session_id: Option<String>,
        skill_used: Option<String>,
    ) -> Self {
        Self {
            message: message.into(),
            status: ResponseStatus::Success,
            data: Map::new(),
            session_id,
            skill_used,
        }
    }

    /// An error response carries a descriptive message and never claims a
    /// skill that did not execute.
    pub fn error(message: impl Into<String>, session_id: Option<String>) -> Self {
        Self {
            message: message.into(),
            status: ResponseStatus::Error,
            data: Map::new(),
            session_id,
            skill_used: None,
        }
    }

    pub fn with_data(mut self, data: Map<String, Value>) -> Self {
        self.data = data;
        self
    }

    pub fn is_error(&self) -> bool {
        self.status == ResponseStatus::Error
    }

    /// Render the response as task artifacts: one text artifact always, one
    /// data artifact only when the response carries non-empty data.
    pub fn to_artifacts(&self) -> Vec<Artifact> {
        let mut artifacts = vec![Artifact::text("response", &self.message)];
        if !self.data.is_empty() {
            artifacts.push(Artifact::data("response-data", self.data.clone()));
        }
        artifacts
    }
}
