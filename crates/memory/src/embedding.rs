//! Embedding generation for idea similarity using fastembed.
//!
//! The default model is all-MiniLM-L6-v2 (384 dimensions), matching the
//! `vector(384)` column of the idea table.

use std::sync::Arc;

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use ideaforge_common::{IdeaForgeError, Result};
use once_cell::sync::OnceCell;
use tokio::task;
use tracing::{debug, info, instrument};

/// Turns text into a fixed-length vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    fn dimension(&self) -> usize;
}

/// fastembed-backed embedder.
///
/// The model is initialized on first use and shared across all calls.
pub struct EmbeddingService {
    model_name: EmbeddingModel,
    dimension: usize,
    model: OnceCell<Arc<TextEmbedding>>,
}

impl EmbeddingService {
    /// Creates a new embedding service. The model is not loaded until the
    /// first embedding call.
    pub fn new(model_name: EmbeddingModel, dimension: usize) -> Self {
        Self {
            model_name,
            dimension,
            model: OnceCell::new(),
        }
    }

    /// Creates a service from a model name, checking the configured dimension.
    pub fn from_config(model_name: &str, expected_dim: usize) -> Result<Self> {
        let (model, dimension) = match model_name {
            "all-MiniLM-L6-v2" | "AllMiniLML6V2" => (EmbeddingModel::AllMiniLML6V2, 384),
            "all-MiniLM-L12-v2" | "AllMiniLML12V2" => (EmbeddingModel::AllMiniLML12V2, 384),
            "bge-small-en-v1.5" | "BGESmallENV15" => (EmbeddingModel::BGESmallENV15, 384),
            "bge-base-en-v1.5" | "BGEBaseENV15" => (EmbeddingModel::BGEBaseENV15, 768),
            "nomic-embed-text-v1.5" | "NomicEmbedTextV15" => {
                (EmbeddingModel::NomicEmbedTextV15, 768)
            }
            _ => {
                return Err(IdeaForgeError::Config(format!(
                    "Unknown embedding model: '{model_name}'"
                )));
            }
        };

        if dimension != expected_dim {
            return Err(IdeaForgeError::Config(format!(
                "Dimension mismatch: model '{model_name}' produces {dimension}-dim vectors but config specifies {expected_dim}"
            )));
        }

        Ok(Self::new(model, dimension))
    }

    #[instrument(skip(self))]
    fn get_or_init_model(&self) -> Result<Arc<TextEmbedding>> {
        self.model
            .get_or_try_init(|| {
                info!(model = ?self.model_name, "Initializing embedding model");

                let options =
                    InitOptions::new(self.model_name.clone()).with_show_download_progress(false);
                let model = TextEmbedding::try_new(options)
                    .map_err(|e| IdeaForgeError::Embedding(format!("model init failed: {e}")))?;

                info!(dimension = self.dimension, "Embedding model ready");
                Ok(Arc::new(model))
            })
            .cloned()
    }
}

impl Default for EmbeddingService {
    fn default() -> Self {
        Self::new(EmbeddingModel::AllMiniLML6V2, 384)
    }
}

#[async_trait]
impl Embedder for EmbeddingService {
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let model = self.get_or_init_model()?;
        let text = text.to_string();

        // fastembed is synchronous
        let embeddings = task::spawn_blocking(move || model.embed(vec![text], None))
            .await
            .map_err(|e| IdeaForgeError::Embedding(format!("embedding task failed: {e}")))?
            .map_err(|e| IdeaForgeError::Embedding(e.to_string()))?;

        let embedding = embeddings
            .into_iter()
            .next()
            .ok_or_else(|| IdeaForgeError::Embedding("empty embedding result".into()))?;

        debug!(dimension = embedding.len(), "Generated embedding");
        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Cosine similarity of two vectors, 0.0 when either has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| f64::from(*x) * f64::from(*y)).sum();
    let norm_a: f64 = a.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_minilm() {
        assert_eq!(EmbeddingService::default().dimension(), 384);
    }

    #[test]
    fn from_config_checks_dimension() {
        assert!(EmbeddingService::from_config("all-MiniLM-L6-v2", 384).is_ok());
        assert!(EmbeddingService::from_config("all-MiniLM-L6-v2", 768).is_err());
        assert!(EmbeddingService::from_config("text-embedding-3-small", 1536).is_err());
    }

    #[test]
    fn cosine_similarity_bounds() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-9);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-9);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    #[ignore = "Downloads model from network, slow"]
    async fn related_ideas_embed_closer() {
        let service = EmbeddingService::default();

        let walk = service.embed("On-demand dog walking app").await.unwrap();
        let sitting = service.embed("Pet sitting marketplace for busy owners").await.unwrap();
        let chips = service.embed("Semiconductor lithography equipment").await.unwrap();

        assert_eq!(walk.len(), 384);
        assert!(cosine_similarity(&walk, &sitting) > cosine_similarity(&walk, &chips));
    }
}
