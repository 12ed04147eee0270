//! Idea storage with nearest-neighbour search.

use async_trait::async_trait;
use chrono::Utc;
use ideaforge_common::{Result, SimilarIdea, StoredIdea};
use tokio::sync::RwLock;
use tracing::debug;

use crate::embedding::cosine_similarity;

/// Append-only store of ideas, their embeddings and reports.
#[async_trait]
pub trait IdeaStore: Send + Sync {
    /// Insert a new record and return its surrogate id.
    async fn insert(
        &self,
        idea: &str,
        embedding: Vec<f32>,
        report: serde_json::Value,
    ) -> Result<i64>;

    /// Up to `limit` records ordered by descending cosine similarity.
    async fn search(&self, embedding: &[f32], limit: usize) -> Result<Vec<SimilarIdea>>;

    async fn get(&self, id: i64) -> Result<Option<StoredIdea>>;

    /// Whether the backing store is reachable.
    async fn health_check(&self) -> bool;
}

struct Row {
    stored: StoredIdea,
    embedding: Vec<f32>,
}

/// Process-local store used for tests and database-less runs.
#[derive(Default)]
pub struct InMemoryIdeaStore {
    rows: RwLock<Vec<Row>>,
}

impl InMemoryIdeaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl IdeaStore for InMemoryIdeaStore {
    async fn insert(
        &self,
        idea: &str,
        embedding: Vec<f32>,
        report: serde_json::Value,
    ) -> Result<i64> {
        let mut rows = self.rows.write().await;
        let id = rows.len() as i64 + 1;
        rows.push(Row {
            stored: StoredIdea {
                id,
                idea: idea.to_string(),
                report,
                created_at: Some(Utc::now()),
            },
            embedding,
        });
        debug!(id, "Inserted idea into in-memory store");
        Ok(id)
    }

    async fn search(&self, embedding: &[f32], limit: usize) -> Result<Vec<SimilarIdea>> {
        let rows = self.rows.read().await;
        let mut results: Vec<SimilarIdea> = rows
            .iter()
            .map(|row| SimilarIdea {
                id: row.stored.id,
                idea: row.stored.idea.clone(),
                report: row.stored.report.clone(),
                similarity: cosine_similarity(embedding, &row.embedding).clamp(0.0, 1.0),
            })
            .collect();

        results.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        results.truncate(limit);
        Ok(results)
    }

    async fn get(&self, id: i64) -> Result<Option<StoredIdea>> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .find(|row| row.stored.id == id)
            .map(|row| row.stored.clone()))
    }

    async fn health_check(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn ids_are_sequential() {
        let store = InMemoryIdeaStore::new();
        assert!(store.is_empty().await);
        let a = store.insert("a", vec![1.0, 0.0], json!({})).await.unwrap();
        let b = store.insert("b", vec![0.0, 1.0], json!({})).await.unwrap();
        assert_eq!((a, b), (1, 2));
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn search_ranks_by_similarity_and_truncates() {
        let store = InMemoryIdeaStore::new();
        store.insert("far", vec![0.0, 1.0], json!({})).await.unwrap();
        store.insert("near", vec![1.0, 0.1], json!({})).await.unwrap();
        store.insert("exact", vec![1.0, 0.0], json!({})).await.unwrap();

        let results = store.search(&[1.0, 0.0], 2).await.unwrap();
        let ideas: Vec<_> = results.iter().map(|r| r.idea.as_str()).collect();
        assert_eq!(ideas, vec!["exact", "near"]);
        assert!(results.iter().all(|r| (0.0..=1.0).contains(&r.similarity)));
    }

    #[tokio::test]
    async fn opposite_vectors_clamp_to_zero() {
        let store = InMemoryIdeaStore::new();
        store.insert("opposite", vec![-1.0, 0.0], json!({})).await.unwrap();
        let results = store.search(&[1.0, 0.0], 5).await.unwrap();
        assert_eq!(results[0].similarity, 0.0);
    }

    #[tokio::test]
    async fn get_returns_none_for_unknown_id() {
        let store = InMemoryIdeaStore::new();
        store.insert("x", vec![1.0], json!({"success_probability": 40.0})).await.unwrap();
        assert!(store.get(1).await.unwrap().is_some());
        assert!(store.get(99).await.unwrap().is_none());
    }
}
