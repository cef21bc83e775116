//! A2A HTTP server — serves the agent card and the task endpoints
//!
//! Thin transport over the processor: each inbound message becomes a task
//! that runs synchronously within its handler. Finished tasks stay in an
//! in-memory map for the process lifetime so polling callers and the
//! synchronous caller see the same information.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::processor::RequestProcessor;
use crate::protocol::{
    AgentCard, AgentRequest, ErrorResponse, ResponseStatus, SendMessageRequest, Task, TaskState,
    TaskStatus,
};
use crate::task::TaskUpdater;

#[derive(Clone)]
struct AppState {
    card: Arc<AgentCard>,
    processor: Arc<dyn RequestProcessor>,
    tasks: Arc<RwLock<HashMap<String, Task>>>,
}

/// A2A server for one agent
pub struct A2aServer {
    state: AppState,
    host: String,
    port: u16,
}

impl A2aServer {
    pub fn new(
        card: AgentCard,
        processor: Arc<dyn RequestProcessor>,
        host: impl Into<String>,
        port: u16,
    ) -> Self {
        Self {
            state: AppState {
                card: Arc::new(card),
                processor,
                tasks: Arc::new(RwLock::new(HashMap::new())),
            },
            host: host.into(),
            port,
        }
    }

    /// Build the axum router; exposed separately for tests
    pub fn router(&self) -> Router {
        Router::new()
            .route("/.well-known/agent.json", get(get_card))
            .route("/a2a/tasks", post(send_task))
            .route("/a2a/tasks/{id}", get(get_task).delete(cancel_task))
            .layer(tower_http::cors::CorsLayer::permissive())
            .with_state(self.state.clone())
    }

    /// Bind and serve until the process exits
    pub async fn run(self) -> Result<()> {
        let addr = format!("{}:{}", self.host, self.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        info!("A2A server for '{}' listening on {}", self.state.card.name, addr);
        axum::serve(listener, self.router())
            .await
            .context("A2A server terminated")?;
        Ok(())
    }
}

async fn get_card(State(state): State<AppState>) -> Json<AgentCard> {
    Json((*state.card).clone())
}

async fn send_task(
    State(state): State<AppState>,
    Json(req): Json<SendMessageRequest>,
) -> Json<Task> {
    let mut updater = TaskUpdater::submit(req.task_id.clone(), req.context_id.clone());

    let mut request = AgentRequest::from_message(&req.message);
    let session_id = Uuid::new_v4().to_string();
    request.session_id = Some(session_id.clone());

    // Fresh task, submitted → working
    if let Err(e) = updater.start() {
        warn!("Could not start task {}: {}", updater.task().id, e);
    }
    state
        .tasks
        .write()
        .await
        .insert(updater.task().id.clone(), updater.task().clone());

    let response = state.processor.process(&request, &session_id).await;
    match response.status {
        ResponseStatus::Success => {
            if let Err(e) = updater.complete(response.to_artifacts()) {
                warn!("Could not complete task {}: {}", updater.task().id, e);
            }
        }
        // Polling and synchronous callers observe the same failure message
        ResponseStatus::Error => updater.fail(&response.message),
    }

    let task = updater.into_task();
    let mut tasks = state.tasks.write().await;
    match tasks.get(&task.id) {
        // A cancel landed while we were processing; that was the task's one
        // terminal transition and our result must not re-finalize it
        Some(stored) if stored.status.state.is_terminal() => {
            warn!(
                "Task {} was {} mid-flight, discarding {} result",
                task.id, stored.status.state, task.status.state
            );
            Json(stored.clone())
        }
        _ => {
            tasks.insert(task.id.clone(), task.clone());
            Json(task)
        }
    }
}

async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Task>, (StatusCode, Json<ErrorResponse>)> {
    match state.tasks.read().await.get(&id) {
        Some(task) => Ok(Json(task.clone())),
        None => Err(not_found(&id)),
    }
}

/// External cancel signal. Only updates the local task state; it does not
/// interrupt an in-flight runtime or peer call.
async fn cancel_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Task>, (StatusCode, Json<ErrorResponse>)> {
    let mut tasks = state.tasks.write().await;
    let Some(task) = tasks.get_mut(&id) else {
        return Err(not_found(&id));
    };

    if task.status.state.is_terminal() {
        return Err((
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: format!("Task {} already {}", id, task.status.state),
            }),
        ));
    }

    info!("Task {} canceled by request", id);
    task.status = TaskStatus {
        state: TaskState::Canceled,
        message: None,
        timestamp: Utc::now(),
    };
    Ok(Json(task.clone()))
}

fn not_found(id: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("Unknown task: {}", id),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::build_agent_card;
    use crate::client::PeerClient;
    use crate::processor::{DefaultProcessor, ResponseHook};
    use crate::protocol::{Message, Part};
    use async_trait::async_trait;
    use confab_core::runtime::{AgentRuntime, RuntimeEvent};
    use confab_core::skills::{SkillDefinition, SkillRegistry};
    use serde_json::Map;
    use tokio::sync::mpsc;

    struct EchoRuntime;

    #[async_trait]
    impl AgentRuntime for EchoRuntime {
        fn name(&self) -> &str {
            "echo"
        }

        async fn run(
            &self,
            prompt: &str,
            _session_id: &str,
        ) -> anyhow::Result<mpsc::Receiver<RuntimeEvent>> {
            let (tx, rx) = mpsc::channel(1);
            tx.send(RuntimeEvent::Final(format!("echo: {}", prompt)))
                .await
                .ok();
            Ok(rx)
        }
    }

    /// Runtime slow enough for a cancel to land mid-flight
    struct SlowRuntime;

    #[async_trait]
    impl AgentRuntime for SlowRuntime {
        fn name(&self) -> &str {
            "slow"
        }

        async fn run(
            &self,
            _prompt: &str,
            _session_id: &str,
        ) -> anyhow::Result<mpsc::Receiver<RuntimeEvent>> {
            let (tx, rx) = mpsc::channel(1);
            tokio::spawn(async move {
                tokio::time::sleep(std::time::Duration::from_millis(500)).await;
                tx.send(RuntimeEvent::Final("late result".to_string()))
                    .await
                    .ok();
            });
            Ok(rx)
        }
    }

    struct FailingRuntime;

    #[async_trait]
    impl AgentRuntime for FailingRuntime {
        fn name(&self) -> &str {
            "failing"
        }

        async fn run(
            &self,
            _prompt: &str,
            _session_id: &str,
        ) -> anyhow::Result<mpsc::Receiver<RuntimeEvent>> {
            Err(anyhow::anyhow!("model melted"))
        }
    }

    fn poetry_registry() -> Arc<SkillRegistry> {
        Arc::new(SkillRegistry::from_skills(vec![SkillDefinition::new(
            "haiku",
            "Haiku Writing",
            "Writes haiku",
        )]))
    }

    async fn spawn_server() -> String {
        spawn_server_with(EchoRuntime).await
    }

    async fn spawn_server_with(runtime: impl AgentRuntime + 'static) -> String {
        let registry = poetry_registry();
        let processor = Arc::new(DefaultProcessor::new(Arc::new(runtime), registry.clone()));
        spawn_with_processor(processor, &registry).await
    }

    async fn spawn_with_processor(
        processor: Arc<dyn RequestProcessor>,
        registry: &SkillRegistry,
    ) -> String {
        let card = build_agent_card("poet", "Writes poems", "1.0", "http://x/", false, registry);
        let server = A2aServer::new(card, processor, "127.0.0.1", 0);
        let router = server.router();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_agent_card_endpoint() {
        let base = spawn_server().await;
        let card: AgentCard = reqwest::get(format!("{}/.well-known/agent.json", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(card.name, "poet");
        assert_eq!(card.skills[0].id, "haiku");
        assert!(card.capabilities.state_transition_history);
    }

    #[tokio::test]
    async fn test_send_task_completes_with_artifacts() {
        let base = spawn_server().await;
        let client = reqwest::Client::new();

        let mut data = Map::new();
        data.insert("skill_id".to_string(), serde_json::json!("haiku"));
        let mut message = Message::user("Write a haiku about rain");
        message.parts.push(Part::Data { data });

        let task: Task = client
            .post(format!("{}/a2a/tasks", base))
            .json(&SendMessageRequest {
                message,
                task_id: None,
                context_id: None,
            })
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(task.status.state, TaskState::Completed);
        assert_eq!(task.artifacts.len(), 1);
        match &task.artifacts[0].parts[0] {
            Part::Text { text } => assert!(text.starts_with("echo: [skill: haiku]")),
            other => panic!("expected text part, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_poll_finished_task() {
        let base = spawn_server().await;
        let client = reqwest::Client::new();

        let task: Task = client
            .post(format!("{}/a2a/tasks", base))
            .json(&SendMessageRequest {
                message: Message::user("hello"),
                task_id: Some("task-42".to_string()),
                context_id: None,
            })
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(task.id, "task-42");

        let polled: Task = client
            .get(format!("{}/a2a/tasks/task-42", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(polled.status.state, TaskState::Completed);
    }

    #[tokio::test]
    async fn test_get_unknown_task_is_404() {
        let base = spawn_server().await;
        let resp = reqwest::get(format!("{}/a2a/tasks/nope", base)).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cancel_terminal_task_is_conflict() {
        let base = spawn_server().await;
        let client = reqwest::Client::new();

        let task: Task = client
            .post(format!("{}/a2a/tasks", base))
            .json(&SendMessageRequest {
                message: Message::user("hello"),
                task_id: None,
                context_id: None,
            })
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        let resp = client
            .delete(format!("{}/a2a/tasks/{}", base, task.id))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_cancel_during_processing_is_not_overwritten() {
        let base = spawn_server_with(SlowRuntime).await;
        let client = reqwest::Client::new();

        let post = tokio::spawn({
            let client = client.clone();
            let base = base.clone();
            async move {
                client
                    .post(format!("{}/a2a/tasks", base))
                    .json(&SendMessageRequest {
                        message: Message::user("take your time"),
                        task_id: Some("race-1".to_string()),
                        context_id: None,
                    })
                    .send()
                    .await
                    .unwrap()
                    .json::<Task>()
                    .await
                    .unwrap()
            }
        });

        // Cancel while the runtime is still working
        tokio::time::sleep(std::time::Duration::from_millis(150)).await;
        let canceled: Task = client
            .delete(format!("{}/a2a/tasks/race-1", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(canceled.status.state, TaskState::Canceled);

        // The cancel was the one terminal transition; the late result must
        // not re-finalize the task for either kind of caller
        let returned = post.await.unwrap();
        assert_eq!(returned.status.state, TaskState::Canceled);

        let polled: Task = client
            .get(format!("{}/a2a/tasks/race-1", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(polled.status.state, TaskState::Canceled);
        assert!(polled.artifacts.is_empty());
    }

    #[tokio::test]
    async fn test_runtime_failure_marks_task_failed() {
        let base = spawn_server_with(FailingRuntime).await;
        let client = reqwest::Client::new();

        let task: Task = client
            .post(format!("{}/a2a/tasks", base))
            .json(&SendMessageRequest {
                message: Message::user("hello"),
                task_id: None,
                context_id: None,
            })
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(task.status.state, TaskState::Failed);
        // Failure message travels both as status message and as an artifact
        let status_message = task.status.message.clone().unwrap();
        assert!(status_message.contains("model melted"));
        assert_eq!(task.artifacts.len(), 1);
        match &task.artifacts[0].parts[0] {
            Part::Text { text } => assert!(text.contains("model melted")),
            other => panic!("expected text part, got {:?}", other),
        }
    }

    /// Hook that delegates every response to a peer for review
    struct DelegatingHook {
        client: PeerClient,
    }

    #[async_trait]
    impl ResponseHook for DelegatingHook {
        async fn transform(
            &self,
            message: String,
            request: &AgentRequest,
        ) -> anyhow::Result<String> {
            let review = self.client.delegate("reviewer", request).await;
            Ok(format!("{} | review: {}", message, review.message))
        }
    }

    #[tokio::test]
    async fn test_failed_delegation_leaves_caller_task_terminal() {
        let registry = poetry_registry();
        // Registered peer that can never answer in time
        let peers = HashMap::from([("reviewer".to_string(), "http://127.0.0.1:1".to_string())]);
        let hook = Arc::new(DelegatingHook {
            client: PeerClient::with_timeout(peers, std::time::Duration::from_millis(200)),
        });
        let processor = Arc::new(
            DefaultProcessor::new(Arc::new(EchoRuntime), registry.clone()).with_hook(hook),
        );
        let base = spawn_with_processor(processor, &registry).await;

        let task: Task = reqwest::Client::new()
            .post(format!("{}/a2a/tasks", base))
            .json(&SendMessageRequest {
                message: Message::user("write a poem"),
                task_id: None,
                context_id: None,
            })
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        // The caller's task still reaches its own terminal state; the
        // delegation failure only shows up as text naming the peer
        assert_eq!(task.status.state, TaskState::Completed);
        match &task.artifacts[0].parts[0] {
            Part::Text { text } => {
                assert!(text.starts_with("echo:"));
                assert!(text.contains("reviewer"));
            }
            other => panic!("expected text part, got {:?}", other),
        }
    }
}
