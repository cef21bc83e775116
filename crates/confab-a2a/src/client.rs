//! Peer collaboration client — delegates work to other agents
//!
//! Peers are addressed purely by a configured name → base URL mapping.
//! Delegation is at-most-once: no retry, one fixed timeout, and every
//! failure folds into an error response naming the peer.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use serde_json::Map;
use tracing::{debug, info, warn};

use crate::protocol::{
    AgentCard, AgentRequest, AgentResponse, Message, Part, SendMessageRequest, Task, TaskState,
};

/// Fixed timeout for one delegation call
const DELEGATE_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for sending tasks to peer agents
pub struct PeerClient {
    http: Client,
    peers: HashMap<String, String>,
}

impl PeerClient {
    pub fn new(peers: HashMap<String, String>) -> Self {
        Self::with_timeout(peers, DELEGATE_TIMEOUT)
    }

    /// Client with a non-default timeout; delegation still makes at most
    /// one attempt per call
    pub fn with_timeout(peers: HashMap<String, String>, timeout: Duration) -> Self {
        Self {
            http: Client::builder()
                .timeout(timeout)
                .build()
                .expect("failed to build HTTP client"),
            peers,
        }
    }

    /// Names of all configured peers
    pub fn peer_names(&self) -> Vec<&str> {
        self.peers.keys().map(|s| s.as_str()).collect()
    }

    /// Delegate a request to a named peer.
    ///
    /// An unknown peer returns immediately with an error response and no
    /// network call. Transport failures, timeouts, and malformed peer
    /// payloads are all converted into error responses naming the peer.
    pub async fn delegate(&self, peer_name: &str, request: &AgentRequest) -> AgentResponse {
        let Some(base_url) = self.peers.get(peer_name) else {
            return AgentResponse::error(
                format!("Unknown peer agent '{}'", peer_name),
                request.session_id.clone(),
            );
        };

        match self.send_task(base_url, request).await {
            Ok(task) => collect_response(peer_name, &task, request),
            Err(e) => {
                warn!("Delegation to '{}' failed: {:#}", peer_name, e);
                AgentResponse::error(
                    format!("Delegation to '{}' failed: {:#}", peer_name, e),
                    request.session_id.clone(),
                )
            }
        }
    }

    /// Fetch a peer's agent card for discovery
    pub async fn fetch_agent_card(&self, peer_name: &str) -> Result<AgentCard> {
        let base_url = self
            .peers
            .get(peer_name)
            .ok_or_else(|| anyhow!("Unknown peer agent '{}'", peer_name))?;
        let url = format!(
            "{}/.well-known/agent.json",
            base_url.trim_end_matches('/')
        );
        debug!("Fetching agent card from {}", url);

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to connect to peer at {}", url))?;

        if !resp.status().is_success() {
            return Err(anyhow!("Agent card request failed: HTTP {}", resp.status()));
        }

        let card: AgentCard = resp.json().await.context("Failed to parse agent card")?;
        info!(
            "Fetched agent card: {} ({} skills)",
            card.name,
            card.skills.len()
        );
        Ok(card)
    }

    async fn send_task(&self, base_url: &str, request: &AgentRequest) -> Result<Task> {
        let url = format!("{}/a2a/tasks", base_url.trim_end_matches('/'));
        debug!("Delegating task to {}", url);

        let mut message = Message::user(&request.message);
        if !request.context.is_empty() {
            message.parts.push(Part::Data {
                data: request.context.clone(),
            });
        }
        let body = SendMessageRequest {
            message,
            task_id: None,
            context_id: None,
        };

        let resp = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Failed to reach peer at {}", url))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(anyhow!("Peer returned HTTP {} — {}", status, text));
        }

        resp.json().await.context("Failed to parse peer task")
    }
}

/// Fold a finished peer task into a response: text parts concatenate in
/// order, data parts merge with later keys winning.
fn collect_response(peer_name: &str, task: &Task, request: &AgentRequest) -> AgentResponse {
    if task.status.state != TaskState::Completed {
        let detail = task.status.message.clone().unwrap_or_default();
        return AgentResponse::error(
            format!(
                "Peer '{}' finished with status {}: {}",
                peer_name, task.status.state, detail
            ),
            request.session_id.clone(),
        );
    }

    let mut text = String::new();
    let mut data = Map::new();
    for artifact in &task.artifacts {
        for part in &artifact.parts {
            match part {
                Part::Text { text: t } => text.push_str(t),
                Part::Data { data: d } => {
                    for (k, v) in d {
                        data.insert(k.clone(), v.clone());
                    }
                }
            }
        }
    }

    info!("Task {} completed by peer '{}'", task.id, peer_name);
    AgentResponse::success(text, request.session_id.clone(), None).with_data(data)
}
