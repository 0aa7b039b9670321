//! `reqpipe`: requirement pipeline service binary.
//!
//! Loads `reqpipe.toml`, wires the stage executors to their collaborators
//! (HTTP clients when a URL is configured, deterministic stubs otherwise),
//! recovers any unfinished items, and serves the HTTP API.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::WrapErr;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rp_core::clients::{
    DocumentStore, HttpDocumentStore, HttpTextGenerator, HttpTicketTracker, HttpWikiPublisher,
    StubDocumentStore, StubTextGenerator, StubTicketTracker, StubWikiPublisher, TextGenerator,
    TicketTracker, WikiPublisher,
};
use rp_core::config::{load_config, CollaboratorConfig};
use rp_core::engine::Orchestrator;
use rp_core::gateway::SubmissionGateway;
use rp_core::stages::{
    DesignExecutor, DocumentExecutor, ExecutorRegistry, GenerationExecutor, StageExecutor,
    ValidationExecutor,
};
use rp_core::store::{ItemStore, MemoryStore};
use rp_server::AppState;

#[derive(Parser)]
#[command(name = "reqpipe", about = "Requirement processing pipeline service", version)]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, default_value = "reqpipe.toml")]
    config: PathBuf,

    /// Override the configured bind address.
    #[arg(long)]
    bind: Option<String>,
}

/// Build the stage executors from the collaborator configuration.
fn build_registry(collaborators: &CollaboratorConfig) -> ExecutorRegistry {
    let generator: Arc<dyn TextGenerator> = match &collaborators.generator_url {
        Some(url) => Arc::new(HttpTextGenerator::new(url.clone())),
        None => Arc::new(StubTextGenerator::new()),
    };
    let documents: Arc<dyn DocumentStore> = match &collaborators.document_url {
        Some(url) => Arc::new(HttpDocumentStore::new(url.clone())),
        None => Arc::new(StubDocumentStore::new()),
    };
    let tickets: Arc<dyn TicketTracker> = match &collaborators.tracker_url {
        Some(url) => Arc::new(HttpTicketTracker::new(url.clone())),
        None => Arc::new(StubTicketTracker::new()),
    };
    let wiki: Arc<dyn WikiPublisher> = match &collaborators.wiki_url {
        Some(url) => Arc::new(HttpWikiPublisher::new(url.clone())),
        None => Arc::new(StubWikiPublisher::new()),
    };

    let executors: Vec<Arc<dyn StageExecutor>> = vec![
        Arc::new(ValidationExecutor::new()),
        Arc::new(GenerationExecutor::new(generator)),
        Arc::new(DocumentExecutor::new(documents, tickets)),
        Arc::new(DesignExecutor::new(wiki)),
    ];
    ExecutorRegistry::new(executors)
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config).wrap_err("failed to load configuration")?;

    let store: Arc<dyn ItemStore> = Arc::new(MemoryStore::new());
    let registry = build_registry(&config.collaborators);
    let orchestrator = Arc::new(Orchestrator::new(
        store.clone(),
        registry,
        config.pipeline.retry_policy(),
    ));

    let resumed = orchestrator.recover().await?;
    if resumed > 0 {
        info!(count = resumed, "resumed unfinished requirements");
    }

    let gateway = SubmissionGateway::new(store.clone(), orchestrator);
    let state = Arc::new(AppState { gateway, store });

    let bind = cli.bind.unwrap_or(config.server.bind_addr);
    let addr: SocketAddr = bind
        .parse()
        .wrap_err_with(|| format!("invalid bind address '{}'", bind))?;

    rp_server::serve(addr, state)
        .await
        .map_err(|e| color_eyre::eyre::eyre!(e))
}
