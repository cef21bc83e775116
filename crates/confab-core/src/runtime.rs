//! Agent runtime abstraction — the reasoning engine behind an agent
//!
//! A runtime takes a composed prompt and a session id and produces a stream
//! of events ending in at most one `Final` event. Consumers stop reading as
//! soon as they see `Final`; a runtime must tolerate its receiver being
//! dropped before the stream drains.

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// One event from a runtime invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeEvent {
    /// Intermediate output (partial text, tool chatter); informational only
    Delta(String),
    /// The final response text; terminal, at most one per invocation
    Final(String),
}

impl RuntimeEvent {
    /// Whether this event ends the stream
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Final(_))
    }
}

/// The reasoning engine an agent delegates its thinking to
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    /// Human-readable runtime name (e.g. "openai-compatible")
    fn name(&self) -> &str;

    /// Run the prompt within the given session, returning the event stream.
    ///
    /// A stream that closes without a `Final` event is a runtime failure;
    /// the caller reports it, not the runtime.
    async fn run(&self, prompt: &str, session_id: &str)
    -> Result<mpsc::Receiver<RuntimeEvent>>;
}
