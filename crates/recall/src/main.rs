//! Recall - MCP server that gives LLM agents persistent memory

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use recall::RecallError;
use recall::config::{self, ServerConfig, Settings, Transport};
use recall::engine::{MemoryEngine, RestEngine};
use recall::error::Result;
use recall::rpc::{McpRouter, RpcServer, stdio};
use recall::tools::ToolDispatcher;

/// Recall - MCP server that gives LLM agents persistent memory
#[derive(Parser)]
#[command(name = "recall")]
#[command(about = "An MCP server that gives LLM agents persistent memory")]
#[command(version)]
pub struct Cli {
    /// Path to settings file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the MCP server (default command)
    #[command(name = "serve")]
    Serve,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    init_logging();

    let cli = Cli::parse();

    match cli.command {
        None | Some(Command::Serve) => serve(cli.config).await,
    }
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,recall=debug"));

    // Logs go to stderr; on the stdio transport stdout carries responses.
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_settings(config_path: Option<PathBuf>) -> Result<Settings> {
    let file_settings = if let Some(path) = config_path {
        tracing::info!("Loading settings from: {}", path.display());
        Settings::from_file(&path)?
    } else {
        let default_paths = [
            dirs::home_dir().map(|h| h.join(".recall").join("config.toml")),
            dirs::config_dir().map(|c| c.join("recall").join("config.toml")),
            Some(PathBuf::from("recall.toml")),
        ];

        let mut found = None;
        for path in default_paths.iter().flatten() {
            if path.exists() {
                tracing::info!("Loading settings from: {}", path.display());
                found = Some(Settings::from_file(path)?);
                break;
            }
        }

        match found {
            Some(settings) => settings,
            None => {
                tracing::info!("No settings file found, using environment only");
                Settings::default()
            }
        }
    };

    // Environment variables win over the file.
    Ok(Settings::from_env().overlay(file_settings))
}

async fn serve(config_path: Option<PathBuf>) -> Result<()> {
    tracing::info!("Starting Recall MCP server");

    let settings = load_settings(config_path)?;
    let backend = config::resolve(&settings);
    let server_config = ServerConfig::from_settings(&settings);
    // Credential values stay out of the logs.
    tracing::debug!(
        "Resolved backend sections: llm={}, embedder={}, graph_store={}",
        backend.llm.is_some(),
        backend.embedder.is_some(),
        backend.graph_store.is_some()
    );

    let engine = RestEngine::new(&server_config.engine_url)
        .map_err(|e| RecallError::Config(e.to_string()))?;

    tracing::info!("Configuring memory engine at {}", server_config.engine_url);
    engine
        .configure(&backend)
        .await
        .map_err(|e| RecallError::Config(format!("Engine rejected backend config: {e}")))?;
    tracing::info!("Memory engine configured");

    let engine: Arc<dyn MemoryEngine> = Arc::new(engine);
    let dispatcher = Arc::new(ToolDispatcher::new(engine));
    let router = Arc::new(McpRouter::new(dispatcher));

    match server_config.transport {
        Transport::Http => {
            let server = RpcServer::new(server_config, router);
            server.serve().await?;
        }
        Transport::Stdio => {
            stdio::serve(router).await?;
        }
    }

    tracing::info!("Recall stopped");
    Ok(())
}
