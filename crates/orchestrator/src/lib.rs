//! Analysis pipeline for IdeaForge.
//!
//! ```text
//!  idea ─► retrieval ─► planner ─┬─► market intelligence ─┐
//!                                ├─► financial strategy  ─┼─► success ─► report ─► critic ─► store
//!                                └─► go-to-market        ─┘
//! ```
//!
//! The [`Orchestrator`] owns the agents and the retriever; every request
//! gets a fresh [`AnalysisContext`] and evaluation tracker. Use
//! [`build_services`] to construct everything from an
//! [`OrchestratorConfig`].

pub mod config;
pub mod pipeline;
pub mod response;

use std::sync::Arc;

use ideaforge_agents::DuckDuckGoSearch;
use ideaforge_common::Result;
use ideaforge_llm::build_llm_client;
use ideaforge_memory::{EmbeddingService, IdeaRetriever, build_store};
use tracing::info;

pub use config::{OrchestratorConfig, ServerConfig};
pub use ideaforge_agents::AnalysisContext;
pub use pipeline::Orchestrator;
pub use response::FeasibilityResponse;

/// Long-lived collaborators shared by every request.
#[derive(Clone)]
pub struct Services {
    pub orchestrator: Arc<Orchestrator>,
    pub retriever: Arc<IdeaRetriever>,
}

/// Build the LLM client, store, embedder, retriever and search provider.
/// Missing credentials surface here as configuration errors.
pub fn build_services(config: &OrchestratorConfig) -> Result<Services> {
    let llm = build_llm_client(&config.llm)?;
    let store = build_store(&config.memory)?;
    let embedder = EmbeddingService::from_config(
        &config.memory.embedding_model,
        config.memory.embedding_dim,
    )?;
    let retriever = Arc::new(IdeaRetriever::new(
        store,
        Arc::new(embedder),
        config.memory.top_k,
    ));
    let search = Arc::new(DuckDuckGoSearch::new(&config.search)?);

    info!(
        backend = ?config.memory.backend,
        top_k = config.memory.top_k,
        "Services ready"
    );

    Ok(Services {
        orchestrator: Arc::new(Orchestrator::new(llm, retriever.clone(), search)),
        retriever,
    })
}
