//! Supabase (PostgREST + pgvector) idea store.
//!
//! Expects a `startup_reports` table with `id`, `idea`, `embedding vector(384)`,
//! `report jsonb` and `created_at` columns, plus a `search_similar_ideas`
//! function taking `(query_embedding, match_count)` and returning
//! `(id, idea, report, similarity)` rows.

use async_trait::async_trait;
use ideaforge_common::{IdeaForgeError, Result, SimilarIdea, StoredIdea};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::store::IdeaStore;
use crate::types::MemoryConfig;

#[derive(Serialize)]
struct InsertRow<'a> {
    idea: &'a str,
    embedding: Vec<f32>,
    report: serde_json::Value,
}

#[derive(Deserialize)]
struct InsertedRow {
    id: i64,
}

#[derive(Serialize)]
struct SearchArgs<'a> {
    query_embedding: &'a [f32],
    match_count: usize,
}

pub struct SupabaseIdeaStore {
    base_url: String,
    table: String,
    search_function: String,
    http_client: reqwest::Client,
}

impl SupabaseIdeaStore {
    /// Build a store from configuration.
    ///
    /// Fails when the URL or key is missing.
    pub fn new(config: &MemoryConfig) -> Result<Self> {
        let url = config
            .supabase_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| IdeaForgeError::Config("SUPABASE_URL must be set".into()))?;
        let key = config
            .supabase_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| IdeaForgeError::Config("SUPABASE_KEY must be set".into()))?;

        let mut headers = HeaderMap::new();
        let invalid = |e: reqwest::header::InvalidHeaderValue| {
            IdeaForgeError::Config(format!("SUPABASE_KEY is not a valid header value: {e}"))
        };
        headers.insert("apikey", HeaderValue::from_str(key).map_err(invalid)?);
        headers.insert(
            reqwest::header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {key}")).map_err(invalid)?,
        );

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| IdeaForgeError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: url.trim_end_matches('/').to_string(),
            table: config.table.clone(),
            search_function: config.search_function.clone(),
            http_client,
        })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    fn rpc_url(&self) -> String {
        format!("{}/rest/v1/rpc/{}", self.base_url, self.search_function)
    }

    async fn send(&self, request: reqwest::RequestBuilder, op: &str) -> Result<reqwest::Response> {
        let response = request
            .send()
            .await
            .map_err(|e| IdeaForgeError::Store(format!("{op} request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IdeaForgeError::Store(format!("{op} returned {status}: {body}")));
        }
        Ok(response)
    }
}

#[async_trait]
impl IdeaStore for SupabaseIdeaStore {
    #[instrument(skip(self, embedding, report), fields(table = %self.table))]
    async fn insert(
        &self,
        idea: &str,
        embedding: Vec<f32>,
        report: serde_json::Value,
    ) -> Result<i64> {
        let request = self
            .http_client
            .post(self.table_url())
            .header("Prefer", "return=representation")
            .json(&InsertRow {
                idea,
                embedding,
                report,
            });

        let rows: Vec<InsertedRow> = self
            .send(request, "insert")
            .await?
            .json()
            .await
            .map_err(|e| IdeaForgeError::Store(format!("invalid insert response: {e}")))?;

        let id = rows
            .first()
            .map(|row| row.id)
            .ok_or_else(|| IdeaForgeError::Store("insert returned no rows".into()))?;

        debug!(id, "Stored idea");
        Ok(id)
    }

    #[instrument(skip(self, embedding))]
    async fn search(&self, embedding: &[f32], limit: usize) -> Result<Vec<SimilarIdea>> {
        let request = self.http_client.post(self.rpc_url()).json(&SearchArgs {
            query_embedding: embedding,
            match_count: limit,
        });

        let mut rows: Vec<SimilarIdea> = self
            .send(request, "similarity search")
            .await?
            .json()
            .await
            .map_err(|e| IdeaForgeError::Store(format!("invalid search response: {e}")))?;

        for row in &mut rows {
            row.similarity = row.similarity.clamp(0.0, 1.0);
        }
        rows.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        rows.truncate(limit);

        debug!(count = rows.len(), "Similarity search complete");
        Ok(rows)
    }

    async fn get(&self, id: i64) -> Result<Option<StoredIdea>> {
        let request = self.http_client.get(self.table_url()).query(&[
            ("id", format!("eq.{id}")),
            ("select", "id,idea,report,created_at".to_string()),
        ]);

        let rows: Vec<StoredIdea> = self
            .send(request, "get")
            .await?
            .json()
            .await
            .map_err(|e| IdeaForgeError::Store(format!("invalid get response: {e}")))?;

        Ok(rows.into_iter().next())
    }

    async fn health_check(&self) -> bool {
        let request = self
            .http_client
            .get(self.table_url())
            .query(&[("select", "id"), ("limit", "1")]);

        match self.send(request, "health check").await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "Database health check failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: Option<&str>, key: Option<&str>) -> MemoryConfig {
        MemoryConfig {
            supabase_url: url.map(String::from),
            supabase_key: key.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn missing_credentials_fail_fast() {
        assert!(SupabaseIdeaStore::new(&config(None, Some("k"))).is_err());
        assert!(SupabaseIdeaStore::new(&config(Some("https://x.supabase.co"), None)).is_err());
        assert!(SupabaseIdeaStore::new(&config(Some(""), Some("k"))).is_err());
    }

    #[test]
    fn urls_follow_postgrest_layout() {
        let store =
            SupabaseIdeaStore::new(&config(Some("https://x.supabase.co/"), Some("k"))).unwrap();
        assert_eq!(store.table_url(), "https://x.supabase.co/rest/v1/startup_reports");
        assert_eq!(store.rpc_url(), "https://x.supabase.co/rest/v1/rpc/search_similar_ideas");
    }
}
