//! confab — run a prompt-driven agent as an A2A peer

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use confab_a2a::{A2aServer, AgentRequest, DefaultProcessor, PeerClient, build_agent_card};
use confab_core::config::AgentConfig;
use confab_core::llm::LlmRuntime;
use confab_core::skills::SkillRegistry;

#[derive(Parser)]
#[command(name = "confab", about = "Run a prompt-driven agent as an A2A peer", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the agent over the A2A protocol
    Serve {
        #[arg(short, long, default_value = "confab.toml")]
        config: PathBuf,
    },
    /// Print the agent card as JSON
    Card {
        #[arg(short, long, default_value = "confab.toml")]
        config: PathBuf,
    },
    /// Send a one-shot message to a configured peer
    Send {
        /// Peer name from the [collaborators] table
        peer: String,
        message: String,
        #[arg(short, long, default_value = "confab.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve { config } => serve(&config).await,
        Command::Card { config } => print_card(&config),
        Command::Send {
            peer,
            message,
            config,
        } => send(&config, &peer, &message).await,
    }
}

async fn serve(path: &Path) -> Result<()> {
    let config = AgentConfig::load(path)?;
    let registry = Arc::new(SkillRegistry::from_skills(config.skills.clone()));
    let runtime = Arc::new(LlmRuntime::new(&config.runtime));
    let processor = Arc::new(DefaultProcessor::new(runtime, registry.clone()));
    let card = build_agent_card(
        &config.name,
        &config.description,
        &config.version,
        &config.base_url(),
        config.streaming,
        &registry,
    );

    info!(
        "Starting agent '{}' on {}:{}",
        config.name, config.host, config.port
    );
    if !registry.is_empty() {
        let names: Vec<&str> = registry.iter().map(|s| s.name.as_str()).collect();
        info!("Skills: {}", names.join(", "));
    }
    if !config.collaborators.is_empty() {
        let names: Vec<&str> = config.collaborators.keys().map(|k| k.as_str()).collect();
        info!("Collaborators: {}", names.join(", "));
    }

    A2aServer::new(card, processor, config.host.clone(), config.port)
        .run()
        .await
}

fn print_card(path: &Path) -> Result<()> {
    let config = AgentConfig::load(path)?;
    let registry = SkillRegistry::from_skills(config.skills.clone());
    let card = build_agent_card(
        &config.name,
        &config.description,
        &config.version,
        &config.base_url(),
        config.streaming,
        &registry,
    );
    println!(
        "{}",
        serde_json::to_string_pretty(&card).context("Failed to serialize agent card")?
    );
    Ok(())
}

async fn send(path: &Path, peer: &str, message: &str) -> Result<()> {
    let config = AgentConfig::load(path)?;
    let client = PeerClient::new(config.collaborators.clone());

    let response = client.delegate(peer, &AgentRequest::new(message)).await;
    println!(
        "{}",
        serde_json::to_string_pretty(&response).context("Failed to serialize response")?
    );
    Ok(())
}
