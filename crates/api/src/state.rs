//! Application state for the API server.

use std::sync::Arc;

use ideaforge_memory::IdeaRetriever;
use ideaforge_orchestrator::{Orchestrator, ServerConfig, Services};

/// Shared application state for the API server.
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,

    /// Used directly by the lookup and health endpoints
    pub retriever: Arc<IdeaRetriever>,

    pub server: ServerConfig,

    /// Server start time (for health checks)
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(services: Services, server: ServerConfig) -> Self {
        Self {
            orchestrator: services.orchestrator,
            retriever: services.retriever,
            server,
            start_time: std::time::Instant::now(),
        }
    }

    /// Get the uptime in seconds.
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
