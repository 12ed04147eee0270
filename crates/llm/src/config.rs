use std::sync::Arc;

use async_trait::async_trait;
use ideaforge_common::{IdeaForgeError, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::client::{LlmClient, LlmRequest, LlmResponse};
use crate::openai::{GROQ_BASE_URL, OLLAMA_BASE_URL, OPENAI_BASE_URL, OpenAiClient};

pub const DEFAULT_MODEL: &str = "llama3-70b-8192";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "groq", "openai" or "ollama".
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    pub api_url: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_requests: usize,
}

fn default_provider() -> String {
    "groq".into()
}

fn default_model() -> String {
    DEFAULT_MODEL.into()
}

fn default_temperature() -> Option<f32> {
    Some(DEFAULT_TEMPERATURE)
}

fn default_max_concurrent() -> usize {
    4
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key: None,
            api_url: None,
            temperature: default_temperature(),
            max_tokens: None,
            max_concurrent_requests: default_max_concurrent(),
        }
    }
}

impl LlmConfig {
    /// Environment variable that carries the key for this provider.
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self.provider.as_str() {
            "groq" => Some("GROQ_API_KEY"),
            "openai" => Some("OPENAI_API_KEY"),
            _ => None,
        }
    }

    fn base_url(&self) -> Result<String> {
        if let Some(ref url) = self.api_url {
            return Ok(url.clone());
        }
        match self.provider.as_str() {
            "groq" => Ok(GROQ_BASE_URL.into()),
            "openai" => Ok(OPENAI_BASE_URL.into()),
            "ollama" => Ok(OLLAMA_BASE_URL.into()),
            other => Err(IdeaForgeError::Config(format!(
                "Unknown LLM provider: {other}"
            ))),
        }
    }
}

/// Bounds the number of in-flight requests against the provider.
pub struct SemaphoredClient {
    inner: Arc<dyn LlmClient>,
    semaphore: Arc<tokio::sync::Semaphore>,
}

impl SemaphoredClient {
    pub fn new(inner: Arc<dyn LlmClient>, max_concurrent: usize) -> Self {
        Self {
            inner,
            semaphore: Arc::new(tokio::sync::Semaphore::new(max_concurrent.max(1))),
        }
    }
}

#[async_trait]
impl LlmClient for SemaphoredClient {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| IdeaForgeError::Llm(format!("semaphore closed: {e}")))?;
        self.inner.complete(request).await
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}

/// Build the shared client from configuration.
///
/// Hosted providers require an API key; a missing key is a configuration
/// error raised here, before any request is served.
pub fn build_llm_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>> {
    let base_url = config.base_url()?;

    let api_key = match config.api_key_env() {
        Some(env_var) => {
            let key = config
                .api_key
                .clone()
                .filter(|k| !k.trim().is_empty())
                .ok_or_else(|| {
                    IdeaForgeError::Config(format!(
                        "{} provider requires an API key (set {env_var})",
                        config.provider
                    ))
                })?;
            Some(key)
        }
        None => config.api_key.clone(),
    };

    info!(
        provider = %config.provider,
        model = %config.model,
        max_concurrent = config.max_concurrent_requests,
        "Building LLM client"
    );

    let client = OpenAiClient::new(base_url, config.model.clone(), api_key)
        .with_defaults(config.temperature, config.max_tokens);

    Ok(Arc::new(SemaphoredClient::new(
        Arc::new(client),
        config.max_concurrent_requests,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_config_from_toml() {
        let config: LlmConfig = toml::from_str(
            r#"
provider = "ollama"
model = "llama3"
api_url = "http://localhost:11434"
max_concurrent_requests = 2
"#,
        )
        .unwrap();
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.model, "llama3");
        assert_eq!(config.api_url.as_deref(), Some("http://localhost:11434"));
        assert_eq!(config.max_concurrent_requests, 2);
        assert_eq!(config.temperature, Some(DEFAULT_TEMPERATURE));
    }

    #[test]
    fn empty_toml_yields_groq_defaults() {
        let config: LlmConfig = toml::from_str("").unwrap();
        assert_eq!(config.provider, "groq");
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.max_concurrent_requests, 4);
        assert_eq!(config.api_key_env(), Some("GROQ_API_KEY"));
    }

    #[test]
    fn groq_without_key_fails_fast() {
        let err = build_llm_client(&LlmConfig::default()).err().unwrap();
        assert!(matches!(err, IdeaForgeError::Config(_)));
        assert!(err.to_string().contains("GROQ_API_KEY"));
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let config = LlmConfig {
            api_key: Some("   ".into()),
            ..Default::default()
        };
        assert!(build_llm_client(&config).is_err());
    }

    #[test]
    fn groq_with_key_builds() {
        let config = LlmConfig {
            api_key: Some("gsk-test".into()),
            ..Default::default()
        };
        let client = build_llm_client(&config).unwrap();
        assert_eq!(client.model_name(), DEFAULT_MODEL);
    }

    #[test]
    fn ollama_needs_no_key() {
        let config = LlmConfig {
            provider: "ollama".into(),
            model: "llama3".into(),
            ..Default::default()
        };
        assert!(build_llm_client(&config).is_ok());
    }

    #[test]
    fn unknown_provider_fails() {
        let config = LlmConfig {
            provider: "gemini".into(),
            ..Default::default()
        };
        assert!(build_llm_client(&config).is_err());
    }

    #[test]
    fn api_key_is_never_serialized() {
        let config = LlmConfig {
            api_key: Some("gsk-secret".into()),
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("gsk-secret"));
    }

    #[tokio::test]
    async fn semaphored_client_limits_concurrency() {
        use std::sync::atomic::{AtomicU32, Ordering};

        struct CountingClient {
            concurrent: Arc<AtomicU32>,
            max_seen: Arc<AtomicU32>,
        }

        #[async_trait]
        impl LlmClient for CountingClient {
            async fn complete(&self, _request: LlmRequest) -> Result<LlmResponse> {
                let current = self.concurrent.fetch_add(1, Ordering::SeqCst) + 1;
                self.max_seen.fetch_max(current, Ordering::SeqCst);
                tokio::time::sleep(tokio::time::Duration::from_millis(30)).await;
                self.concurrent.fetch_sub(1, Ordering::SeqCst);
                Ok(LlmResponse {
                    content: "ok".to_string(),
                    model: "test".to_string(),
                    usage: None,
                    finish_reason: None,
                })
            }
            fn model_name(&self) -> &str {
                "test"
            }
        }

        let concurrent = Arc::new(AtomicU32::new(0));
        let max_seen = Arc::new(AtomicU32::new(0));
        let semaphored = Arc::new(SemaphoredClient::new(
            Arc::new(CountingClient {
                concurrent: concurrent.clone(),
                max_seen: max_seen.clone(),
            }),
            3,
        ));

        let mut handles = vec![];
        for _ in 0..8 {
            let client = semaphored.clone();
            handles.push(tokio::spawn(async move {
                client.complete(LlmRequest::default()).await.unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        assert!(max_seen.load(Ordering::SeqCst) <= 3);
    }
}
