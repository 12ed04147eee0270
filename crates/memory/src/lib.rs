//! Idea memory for IdeaForge.
//!
//! Every finished analysis is embedded and stored so later requests can be
//! conditioned on related prior work.
//!
//! ```text
//!   idea text ──► Embedder ──► IdeaStore.search ──► Vec<SimilarIdea>
//!                                                        │
//!                                  build_context_from_similar_ideas
//!                                                        ▼
//!                                                  prompt context
//! ```
//!
//! Stores:
//!
//! - [`SupabaseIdeaStore`]: PostgREST over a pgvector table
//! - [`InMemoryIdeaStore`]: process-local, for tests and offline runs

pub mod embedding;
pub mod retrieval;
pub mod store;
pub mod supabase;
pub mod types;

use std::sync::Arc;

use ideaforge_common::Result;

pub use embedding::{Embedder, EmbeddingService, cosine_similarity};
pub use retrieval::{IdeaRetriever, NO_SIMILAR_IDEAS, build_context_from_similar_ideas};
pub use store::{IdeaStore, InMemoryIdeaStore};
pub use supabase::SupabaseIdeaStore;
pub use types::{MemoryConfig, StoreBackend};

/// Build the configured store. Missing Supabase credentials are an error.
pub fn build_store(config: &MemoryConfig) -> Result<Arc<dyn IdeaStore>> {
    Ok(match config.backend {
        StoreBackend::Supabase => Arc::new(SupabaseIdeaStore::new(config)?),
        StoreBackend::InMemory => Arc::new(InMemoryIdeaStore::new()),
    })
}
