//! A2A (Agent-to-Agent) protocol adapter for Confab agents
//!
//! Turns an inbound protocol message into a task, drives the task through
//! its lifecycle, routes it to a declared skill, invokes the agent runtime,
//! and optionally delegates sub-work to peer agents before finalizing a
//! result. Provides both server (receive tasks from peers) and client
//! (send tasks to peers).

pub mod card;
pub mod client;
pub mod processor;
pub mod protocol;
pub mod router;
pub mod server;
pub mod task;

pub use card::build_agent_card;
pub use client::PeerClient;
pub use processor::{DefaultProcessor, RequestProcessor, ResponseHook};
pub use protocol::{
    AgentCapabilities, AgentCard, AgentRequest, AgentResponse, Artifact, Message, Part,
    ResponseStatus, Role, SendMessageRequest, Task, TaskState, TaskStatus,
};
pub use router::route_skill;
pub use server::A2aServer;
pub use task::{LifecycleError, TaskEvent, TaskUpdater};
