//! Memory configuration.

use serde::{Deserialize, Serialize};

/// Which idea store backs retrieval.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// Supabase PostgREST with a pgvector column.
    #[default]
    Supabase,
    /// Process-local store, lost on restart.
    InMemory,
}

/// Configuration for embeddings, the idea store and retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Supabase project URL, e.g. `https://xyz.supabase.co`.
    #[serde(default)]
    pub supabase_url: Option<String>,

    /// Supabase service or anon key.
    #[serde(default, skip_serializing)]
    pub supabase_key: Option<String>,

    /// Table holding ideas, embeddings and reports.
    #[serde(default = "default_table")]
    pub table: String,

    /// Postgres function performing the cosine nearest-neighbour search.
    #[serde(default = "default_search_function")]
    pub search_function: String,

    /// Embedding model name
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Embedding dimension, must match the `vector(n)` column
    #[serde(default = "default_embedding_dim")]
    pub embedding_dim: usize,

    /// Similar ideas returned per retrieval
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_table() -> String {
    "startup_reports".into()
}

fn default_search_function() -> String {
    "search_similar_ideas".into()
}

fn default_embedding_model() -> String {
    "all-MiniLM-L6-v2".into()
}

fn default_embedding_dim() -> usize {
    384 // MiniLM dimension
}

fn default_top_k() -> usize {
    5
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            supabase_url: None,
            supabase_key: None,
            table: default_table(),
            search_function: default_search_function(),
            embedding_model: default_embedding_model(),
            embedding_dim: default_embedding_dim(),
            top_k: default_top_k(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_schema() {
        let config = MemoryConfig::default();
        assert_eq!(config.backend, StoreBackend::Supabase);
        assert_eq!(config.table, "startup_reports");
        assert_eq!(config.search_function, "search_similar_ideas");
        assert_eq!(config.embedding_dim, 384);
        assert_eq!(config.top_k, 5);
    }

    #[test]
    fn backend_parses_snake_case() {
        let config: MemoryConfig = toml::from_str(
            r#"
backend = "in_memory"
top_k = 3
"#,
        )
        .unwrap();
        assert_eq!(config.backend, StoreBackend::InMemory);
        assert_eq!(config.top_k, 3);
        assert_eq!(config.embedding_model, "all-MiniLM-L6-v2");
    }
}
