//! OpenAI-compatible chat-completions runtime
//!
//! Thin client for any endpoint speaking the `/chat/completions` shape
//! (OpenAI, LiteLLM proxies, local inference servers). Each invocation
//! yields a single `Final` event; a failed request surfaces as an error
//! from `run` so its description reaches the response.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::config::RuntimeConfig;
use crate::runtime::{AgentRuntime, RuntimeEvent};

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// LLM-backed agent runtime
pub struct LlmRuntime {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    instruction: String,
}

impl LlmRuntime {
    pub fn new(config: &RuntimeConfig) -> Self {
        let api_key = std::env::var(&config.api_key_env).ok();
        if api_key.is_none() {
            warn!(
                "Environment variable {} is not set; runtime requests will be unauthenticated",
                config.api_key_env
            );
        }

        Self {
            http: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("failed to build HTTP client"),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            instruction: config.instruction.clone(),
        }
    }

    fn build_messages(&self, prompt: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::new();
        if !self.instruction.is_empty() {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: self.instruction.clone(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: prompt.to_string(),
        });
        messages
    }
}

async fn complete(req: reqwest::RequestBuilder) -> Result<String> {
    let resp = req.send().await.context("Failed to reach LLM endpoint")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(anyhow!("LLM request failed: HTTP {} — {}", status, body));
    }

    let completion: ChatCompletion = resp
        .json()
        .await
        .context("Failed to parse chat completion")?;

    completion
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .ok_or_else(|| anyhow!("Chat completion contained no choices"))
}

#[async_trait]
impl AgentRuntime for LlmRuntime {
    fn name(&self) -> &str {
        "openai-compatible"
    }

    async fn run(
        &self,
        prompt: &str,
        session_id: &str,
    ) -> Result<mpsc::Receiver<RuntimeEvent>> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!("Invoking {} for session {}", self.model, session_id);

        let body = serde_json::json!({
            "model": self.model,
            "messages": self.build_messages(prompt),
        });

        let mut req = self.http.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        // Await the request here so a descriptive failure reaches the
        // caller instead of a silently closed stream
        let text = complete(req).await?;

        let (tx, rx) = mpsc::channel(1);
        // Buffered send into a fresh channel cannot fail
        let _ = tx.send(RuntimeEvent::Final(text)).await;
        Ok(rx)
    }
}
