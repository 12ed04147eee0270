//! Web search collaborator used by the planner.

use std::time::Duration;

use async_trait::async_trait;
use ideaforge_common::{IdeaForgeError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DUCKDUCKGO_BASE_URL: &str = "https://api.duckduckgo.com";

/// Snippets returned for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub query: String,
    pub results: String,
}

impl SearchResult {
    pub fn has_results(&self) -> bool {
        !self.results.trim().is_empty()
    }
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> Result<SearchResult>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Cap on related-topic snippets per query.
    #[serde(default = "default_max_topics")]
    pub max_topics: usize,
}

fn default_base_url() -> String {
    DUCKDUCKGO_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_topics() -> usize {
    5
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            max_topics: default_max_topics(),
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct InstantAnswer {
    #[serde(rename = "Heading")]
    heading: String,
    #[serde(rename = "AbstractText")]
    abstract_text: String,
    #[serde(rename = "Answer")]
    answer: serde_json::Value,
    #[serde(rename = "RelatedTopics")]
    related_topics: Vec<RelatedTopic>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RelatedTopic {
    #[serde(rename = "Text")]
    text: Option<String>,
    #[serde(rename = "Topics")]
    topics: Vec<RelatedTopic>,
}

impl InstantAnswer {
    fn into_snippets(self, max_topics: usize) -> String {
        let mut snippets = Vec::new();

        if !self.abstract_text.is_empty() {
            if self.heading.is_empty() {
                snippets.push(self.abstract_text);
            } else {
                snippets.push(format!("{}: {}", self.heading, self.abstract_text));
            }
        }
        if let Some(answer) = self.answer.as_str().filter(|a| !a.is_empty()) {
            snippets.push(answer.to_string());
        }

        let topics = self
            .related_topics
            .into_iter()
            .flat_map(|t| match t.text {
                Some(text) => vec![text],
                None => t.topics.into_iter().filter_map(|sub| sub.text).collect(),
            })
            .filter(|text| !text.is_empty())
            .take(max_topics);
        snippets.extend(topics);

        snippets.join("\n")
    }
}

/// DuckDuckGo instant-answer API.
pub struct DuckDuckGoSearch {
    base_url: String,
    max_topics: usize,
    http_client: reqwest::Client,
}

impl DuckDuckGoSearch {
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("ideaforge/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| IdeaForgeError::Config(format!("search client: {e}")))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_topics: config.max_topics,
            http_client,
        })
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoSearch {
    async fn search(&self, query: &str) -> Result<SearchResult> {
        let response = self
            .http_client
            .get(format!("{}/", self.base_url))
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await
            .map_err(|e| IdeaForgeError::Search(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IdeaForgeError::Search(format!(
                "search returned {status}: {body}"
            )));
        }

        let answer: InstantAnswer = response
            .json()
            .await
            .map_err(|e| IdeaForgeError::Search(format!("invalid response: {e}")))?;

        let results = answer.into_snippets(self.max_topics);
        debug!(query = %query, chars = results.len(), "Search completed");

        Ok(SearchResult {
            query: query.to_string(),
            results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn snippets_flatten_nested_topics() {
        let answer: InstantAnswer = serde_json::from_value(json!({
            "Heading": "Dog walking",
            "AbstractText": "Dog walking is the act of walking with a dog.",
            "Answer": "",
            "RelatedTopics": [
                {"Text": "Pet sitting - caring for pets", "FirstURL": "https://x"},
                {"Name": "Services", "Topics": [
                    {"Text": "Rover - pet care marketplace"},
                    {"Text": "Wag - dog walking app"}
                ]},
                {"Text": ""}
            ]
        }))
        .unwrap();

        let snippets = answer.into_snippets(5);
        let lines: Vec<&str> = snippets.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Dog walking: Dog walking is the act of walking with a dog.",
                "Pet sitting - caring for pets",
                "Rover - pet care marketplace",
                "Wag - dog walking app",
            ]
        );
    }

    #[test]
    fn snippets_respect_topic_cap() {
        let answer: InstantAnswer = serde_json::from_value(json!({
            "RelatedTopics": [{"Text": "a"}, {"Text": "b"}, {"Text": "c"}]
        }))
        .unwrap();
        assert_eq!(answer.into_snippets(2), "a\nb");
    }

    #[test]
    fn empty_answer_has_no_results() {
        let answer: InstantAnswer = serde_json::from_value(json!({})).unwrap();
        let result = SearchResult {
            query: "q".into(),
            results: answer.into_snippets(5),
        };
        assert!(!result.has_results());
    }

    #[test]
    fn config_defaults() {
        let config = SearchConfig::default();
        assert_eq!(config.base_url, DUCKDUCKGO_BASE_URL);
        assert_eq!(config.timeout_secs, 10);
        assert!(DuckDuckGoSearch::new(&config).is_ok());
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_search_error() {
        let search = DuckDuckGoSearch::new(&SearchConfig {
            base_url: "http://127.0.0.1:9".into(),
            timeout_secs: 2,
            ..Default::default()
        })
        .unwrap();

        let err = search.search("dog walking").await.unwrap_err();
        assert!(matches!(err, IdeaForgeError::Search(_)));
    }
}
