//! Request processing — skill routing, prompt composition, runtime
//! invocation, and response assembly
//!
//! The processor is the boundary where runtime failures stop: callers
//! always receive a well-formed `AgentResponse`, never a raw error.

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, error};

use confab_core::runtime::{AgentRuntime, RuntimeEvent};
use confab_core::skills::{GENERAL_SKILL_ID, SkillDefinition, SkillRegistry};

use crate::protocol::{AgentRequest, AgentResponse};
use crate::router::route_skill;

/// Processes one request within a session
///
/// Hosting agents supply their own implementation to customize handling;
/// `DefaultProcessor` covers the common skill-routed runtime invocation.
#[async_trait]
pub trait RequestProcessor: Send + Sync {
    /// Always returns a well-formed response; failures surface as
    /// `status = error`, never as raw errors.
    async fn process(&self, request: &AgentRequest, session_id: &str) -> AgentResponse;
}

/// Post-processing applied to a successful response message, e.g. to
/// trigger a peer delegation based on the runtime's output.
#[async_trait]
pub trait ResponseHook: Send + Sync {
    async fn transform(&self, message: String, request: &AgentRequest) -> Result<String>;
}

/// Skill-routed processor backed by an agent runtime
pub struct DefaultProcessor {
    runtime: Arc<dyn AgentRuntime>,
    skills: Arc<SkillRegistry>,
    hook: Option<Arc<dyn ResponseHook>>,
}

impl DefaultProcessor {
    pub fn new(runtime: Arc<dyn AgentRuntime>, skills: Arc<SkillRegistry>) -> Self {
        Self {
            runtime,
            skills,
            hook: None,
        }
    }

    pub fn with_hook(mut self, hook: Arc<dyn ResponseHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    fn compose_prompt(&self, request: &AgentRequest, skill: Option<&SkillDefinition>) -> String {
        let mut prompt = match skill {
            Some(s) => format!("[skill: {}] {}", s.id, request.message),
            None => request.message.clone(),
        };
        if !request.context.is_empty() {
            prompt.push_str("\n\nContext:\n");
            prompt.push_str(&render_context(&request.context));
        }
        prompt
    }

    /// Consume the runtime stream up to the first terminal event. The
    /// receiver is dropped afterwards, abandoning any remaining producer
    /// output.
    async fn run_to_final(&self, prompt: &str, session_id: &str) -> Result<String> {
        let mut rx = self.runtime.run(prompt, session_id).await?;
        while let Some(event) = rx.recv().await {
            match event {
                RuntimeEvent::Delta(chunk) => {
                    debug!("Runtime delta ({} bytes)", chunk.len());
                }
                RuntimeEvent::Final(text) => return Ok(text),
            }
        }
        Err(anyhow!("runtime stream ended without a final response"))
    }

    async fn try_process(&self, request: &AgentRequest, session_id: &str) -> Result<AgentResponse> {
        let skill = route_skill(request, &self.skills);
        let skill_used = skill
            .map(|s| s.id.clone())
            .unwrap_or_else(|| GENERAL_SKILL_ID.to_string());

        let prompt = self.compose_prompt(request, skill);
        let mut message = self.run_to_final(&prompt, session_id).await?;

        if let Some(hook) = &self.hook {
            message = hook
                .transform(message, request)
                .await
                .context("response hook failed")?;
        }

        Ok(AgentResponse::success(
            message,
            Some(session_id.to_string()),
            Some(skill_used),
        ))
    }
}

/// Deterministic context rendering: keys sorted, one `key: value` per line
fn render_context(context: &Map<String, Value>) -> String {
    let mut keys: Vec<&String> = context.keys().collect();
    keys.sort();
    keys.iter()
        .map(|k| format!("{}: {}", k, context[k.as_str()]))
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl RequestProcessor for DefaultProcessor {
    async fn process(&self, request: &AgentRequest, session_id: &str) -> AgentResponse {
        match self.try_process(request, session_id).await {
            Ok(response) => response,
            Err(e) => {
                error!("Request processing failed: {:#}", e);
                AgentResponse::error(
                    format!("Error: {:#}", e),
                    Some(session_id.to_string()),
                )
            }
        }
    }
}
