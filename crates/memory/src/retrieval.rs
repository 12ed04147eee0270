//! Similar-idea retrieval with prompt context building.

use std::sync::Arc;

use ideaforge_common::{Result, SimilarIdea, StoredIdea, truncate};
use tracing::{debug, info};

use crate::embedding::Embedder;
use crate::store::IdeaStore;

pub const NO_SIMILAR_IDEAS: &str = "No similar ideas found in the database.";

/// Retrieves prior analyses for an idea and stores new ones.
pub struct IdeaRetriever {
    store: Arc<dyn IdeaStore>,
    embedder: Arc<dyn Embedder>,
    top_k: usize,
}

impl IdeaRetriever {
    pub fn new(store: Arc<dyn IdeaStore>, embedder: Arc<dyn Embedder>, top_k: usize) -> Self {
        Self {
            store,
            embedder,
            top_k,
        }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Up to `top_k` similar ideas, most similar first. An empty list is a
    /// normal outcome.
    pub async fn retrieve_similar(&self, idea: &str) -> Result<Vec<SimilarIdea>> {
        self.retrieve_similar_k(idea, self.top_k).await
    }

    pub async fn retrieve_similar_k(&self, idea: &str, k: usize) -> Result<Vec<SimilarIdea>> {
        let embedding = self.embedder.embed(idea).await?;
        let results = self.store.search(&embedding, k).await?;
        debug!(count = results.len(), k, "Retrieved similar ideas");
        Ok(results)
    }

    /// Embed and persist an idea with its final report.
    pub async fn store_idea_with_report(
        &self,
        idea: &str,
        report: serde_json::Value,
    ) -> Result<i64> {
        let embedding = self.embedder.embed(idea).await?;
        let id = self.store.insert(idea, embedding, report).await?;
        info!(id, "Stored idea with report");
        Ok(id)
    }

    pub async fn get_idea(&self, id: i64) -> Result<Option<StoredIdea>> {
        self.store.get(id).await
    }

    pub async fn health_check(&self) -> bool {
        self.store.health_check().await
    }
}

/// Format similar ideas as prompt context.
pub fn build_context_from_similar_ideas(similar_ideas: &[SimilarIdea]) -> String {
    if similar_ideas.is_empty() {
        return NO_SIMILAR_IDEAS.to_string();
    }

    let mut parts =
        vec!["Here are similar startup ideas that have been analyzed previously:\n".to_string()];

    for (idx, item) in similar_ideas.iter().enumerate() {
        parts.push(format!(
            "\n{}. Similar Idea (Similarity: {:.2}%):",
            idx + 1,
            item.similarity * 100.0
        ));
        parts.push(format!("   Idea: {}", item.idea));

        if item.report.as_object().is_some_and(|o| !o.is_empty()) {
            let market = item.report_str("market_analysis").unwrap_or("N/A");
            let revenue = item.report_str("revenue_model").unwrap_or("N/A");
            let probability = item
                .report_probability()
                .map(|p| p.to_string())
                .unwrap_or_else(|| "N/A".to_string());

            parts.push(format!("   Market Analysis: {}...", truncate(market, 200)));
            parts.push(format!("   Success Probability: {probability}%"));
            parts.push(format!("   Revenue Model: {}...", truncate(revenue, 150)));
        }
    }

    parts.join("\n")
}
