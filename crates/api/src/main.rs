//! IdeaForge API server binary.
//!
//! Usage:
//!   ideaforge-api --config ideaforge.toml
//!   ideaforge-api --port 8080 --bind 127.0.0.1
//!   ideaforge-api --in-memory   # No Supabase, analyses kept in process
//!
//! # Environment Variables
//!
//! - `GROQ_API_KEY` / `OPENAI_API_KEY` - model provider key
//! - `SUPABASE_URL`, `SUPABASE_KEY` - idea store credentials
//! - `LLM_MODEL`, `LLM_TEMPERATURE`, `TOP_K_SIMILAR`, `APP_NAME`, `APP_VERSION`
//!
//! A `.env` file in the working directory is loaded first.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use ideaforge_api::{AppState, serve};
use ideaforge_memory::StoreBackend;
use ideaforge_orchestrator::{OrchestratorConfig, build_services};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "ideaforge-api", version, about = "IdeaForge startup feasibility API server")]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long, env = "IDEAFORGE_CONFIG")]
    config: Option<PathBuf>,

    /// Bind address, overrides the config file
    #[arg(short, long, env = "HOST")]
    bind: Option<String>,

    /// Port to listen on, overrides the config file
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Keep analyses in process memory instead of Supabase
    #[arg(long)]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Before argument parsing so clap's env fallbacks see .env values
    let env_file = dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "info,ideaforge_api=debug,ideaforge_orchestrator=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Some(path) = env_file {
        tracing::debug!(path = %path.display(), "Loaded .env");
    }

    let args = Args::parse();

    match &args.config {
        Some(path) => tracing::info!(path = %path.display(), "Loading configuration"),
        None => tracing::info!("Using default configuration"),
    }
    let mut config = OrchestratorConfig::load(args.config.as_deref())?;

    if let Some(host) = args.bind {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if args.in_memory {
        tracing::warn!("Using the in-memory idea store; analyses are lost on restart");
        config.memory.backend = StoreBackend::InMemory;
    }
    config.validate()?;

    let services = build_services(&config)?;
    let addr = config.server.resolve_bind_addr().await?;
    let state = AppState::new(services, config.server);

    serve(Arc::new(state), addr).await
}
