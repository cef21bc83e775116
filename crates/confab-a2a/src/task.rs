//! Task lifecycle — drives one task from submission to a terminal state
//!
//! Transitions: submitted → working → completed | failed | canceled.
//! Exactly one terminal transition happens per task; later attempts are
//! rejected with `LifecycleError`. The one exception is `fail`, which
//! absorbs misuse instead of erroring so that failure handling can never
//! itself fail the request pipeline.

use chrono::Utc;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::protocol::{Artifact, Task, TaskState, TaskStatus};

/// Rejected lifecycle transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid task transition: {from} → {to}")]
pub struct LifecycleError {
    pub from: TaskState,
    pub to: TaskState,
}

/// Lifecycle notification for observers
#[derive(Debug, Clone)]
pub enum TaskEvent {
    StateChanged { task_id: String, state: TaskState },
    ArtifactAdded { task_id: String, artifact_id: String },
}

/// Owns the state progression of a single task
///
/// One updater exists per inbound request; it is never shared across
/// request-handling tasks.
pub struct TaskUpdater {
    task: Task,
    events: Option<UnboundedSender<TaskEvent>>,
}

impl TaskUpdater {
    /// Create the task in `submitted`, generating fresh ids when the
    /// inbound message did not supply them.
    pub fn submit(task_id: Option<String>, context_id: Option<String>) -> Self {
        let task = Task {
            id: task_id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            context_id: context_id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            status: TaskStatus {
                state: TaskState::Submitted,
                message: None,
                timestamp: Utc::now(),
            },
            artifacts: Vec::new(),
        };
        debug!("Task {} submitted (context {})", task.id, task.context_id);

        Self { task, events: None }
    }

    /// Attach an observer channel for lifecycle events
    pub fn with_events(mut self, events: UnboundedSender<TaskEvent>) -> Self {
        self.events = Some(events);
        self.emit(TaskEvent::StateChanged {
            task_id: self.task.id.clone(),
            state: self.task.status.state,
        });
        self
    }

    pub fn task(&self) -> &Task {
        &self.task
    }

    pub fn state(&self) -> TaskState {
        self.task.status.state
    }

    pub fn into_task(self) -> Task {
        self.task
    }

    /// submitted → working; must happen before any artifact is attached
    pub fn start(&mut self) -> Result<(), LifecycleError> {
        self.transition(TaskState::Working, &[TaskState::Submitted], None)
    }

    /// working → completed, attaching the result artifacts
    pub fn complete(&mut self, artifacts: Vec<Artifact>) -> Result<(), LifecycleError> {
        self.transition(TaskState::Completed, &[TaskState::Working], None)?;
        for artifact in artifacts {
            self.attach(artifact);
        }
        Ok(())
    }

    /// submitted | working → failed, attaching the failure message as a
    /// text artifact. Absorbs terminal-state misuse: a task that already
    /// finished keeps its original outcome.
    pub fn fail(&mut self, message: &str) {
        let result = self.transition(
            TaskState::Failed,
            &[TaskState::Submitted, TaskState::Working],
            Some(message.to_string()),
        );
        match result {
            Ok(()) => self.attach(Artifact::text("error", message)),
            Err(e) => warn!("Ignoring fail() on task {}: {}", self.task.id, e),
        }
    }

    /// submitted | working → canceled; no artifact is attached
    pub fn cancel(&mut self) -> Result<(), LifecycleError> {
        self.transition(
            TaskState::Canceled,
            &[TaskState::Submitted, TaskState::Working],
            None,
        )
    }

    fn transition(
        &mut self,
        to: TaskState,
        allowed_from: &[TaskState],
        message: Option<String>,
    ) -> Result<(), LifecycleError> {
        let from = self.task.status.state;
        if !allowed_from.contains(&from) {
            return Err(LifecycleError { from, to });
        }

        debug!("Task {}: {} → {}", self.task.id, from, to);
        self.task.status = TaskStatus {
            state: to,
            message,
            timestamp: Utc::now(),
        };
        self.emit(TaskEvent::StateChanged {
            task_id: self.task.id.clone(),
            state: to,
        });
        Ok(())
    }

    fn attach(&mut self, artifact: Artifact) {
        self.emit(TaskEvent::ArtifactAdded {
            task_id: self.task.id.clone(),
            artifact_id: artifact.artifact_id.clone(),
        });
        self.task.artifacts.push(artifact);
    }

    fn emit(&self, event: TaskEvent) {
        if let Some(tx) = &self.events {
            // Observer may be gone; dropped events are acceptable
            let _ = tx.send(event);
        }
    }
}
