//! REST API for the IdeaForge startup feasibility engine.
//!
//! # Endpoints
//!
//! - `GET /` - Service info
//! - `GET /health` - Health check, `degraded` when the idea store is unreachable
//! - `POST /api/analyze` - Run the full analysis pipeline for one idea
//! - `GET /similar/{id}?top_k=5` - A stored idea and its nearest neighbours
//!
//! # Architecture
//!
//! ```text
//! Client
//!    │
//!    ▼
//! ┌─────────────────┐
//! │   HTTP API      │ ◄── This crate
//! │    (Axum)       │
//! └────────┬────────┘
//!          │
//!          ├──────────────────────┐
//!          ▼                      ▼
//! ┌─────────────────┐    ┌─────────────────┐
//! │  Orchestrator   │───►│  IdeaRetriever  │
//! │   (agents)      │    │  (vector store) │
//! └─────────────────┘    └─────────────────┘
//! ```

pub mod routes;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

pub use state::AppState;

/// Create the API router with all routes configured.
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(routes::root))
        .route("/health", get(routes::health))
        .route("/api/analyze", post(routes::analyze))
        .route("/similar/{id}", get(routes::similar_ideas))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the API server on the given address.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> anyhow::Result<()> {
    let router = create_router(state);

    info!(%addr, "Starting IdeaForge API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
