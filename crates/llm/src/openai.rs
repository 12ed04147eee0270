//! Client for OpenAI-compatible chat completion APIs (Groq, OpenAI, Ollama).

use async_trait::async_trait;
use ideaforge_common::{IdeaForgeError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::{LlmClient, LlmRequest, LlmResponse, Role, TokenUsage};

pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const OLLAMA_BASE_URL: &str = "http://localhost:11434";

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    model: String,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: WireMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

pub struct OpenAiClient {
    base_url: String,
    model: String,
    api_key: Option<String>,
    default_temperature: Option<f32>,
    default_max_tokens: Option<u32>,
    http_client: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
            default_temperature: None,
            default_max_tokens: None,
            http_client: reqwest::Client::new(),
        }
    }

    /// Temperature and token cap applied when a request leaves them unset.
    pub fn with_defaults(mut self, temperature: Option<f32>, max_tokens: Option<u32>) -> Self {
        self.default_temperature = temperature;
        self.default_max_tokens = max_tokens;
        self
    }

    fn role_str(role: Role) -> &'static str {
        match role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    fn request_body(&self, request: &LlmRequest) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if let Some(ref system) = request.system_prompt {
            messages.push(WireMessage {
                role: "system".to_string(),
                content: system.clone(),
            });
        }
        messages.extend(request.messages.iter().map(|msg| WireMessage {
            role: Self::role_str(msg.role).to_string(),
            content: msg.content.clone(),
        }));

        ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: request.temperature.or(self.default_temperature),
            max_tokens: request.max_tokens.or(self.default_max_tokens),
        }
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = self.request_body(&request);

        debug!(model = %self.model, messages = body.messages.len(), "Sending chat completion");

        let mut http_req = self.http_client.post(&url).json(&body);
        if let Some(ref key) = self.api_key {
            http_req = http_req.bearer_auth(key);
        }

        let response = http_req
            .send()
            .await
            .map_err(|e| IdeaForgeError::Llm(format!("chat completion request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(IdeaForgeError::Llm(format!(
                "provider returned {status}: {body_text}"
            )));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| IdeaForgeError::Llm(format!("failed to parse completion: {e}")))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| IdeaForgeError::Llm("completion had no choices".to_string()))?;

        Ok(LlmResponse {
            content: choice.message.content,
            model: parsed.model,
            usage: parsed.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
            }),
            finish_reason: choice.finish_reason,
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_places_system_prompt_first() {
        let client = OpenAiClient::new(GROQ_BASE_URL, "llama3-70b-8192", Some("gsk-test".into()));
        let request = LlmRequest::prompt("Extract the industry").with_system("Be terse.");

        let json = serde_json::to_value(client.request_body(&request)).unwrap();

        assert_eq!(json["model"], "llama3-70b-8192");
        let messages = json["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[0]["content"], "Be terse.");
        assert_eq!(messages[1]["role"], "user");
        assert_eq!(messages[1]["content"], "Extract the industry");
    }

    #[test]
    fn defaults_fill_unset_sampling_params() {
        let client = OpenAiClient::new(GROQ_BASE_URL, "llama3-70b-8192", None)
            .with_defaults(Some(0.7), Some(2048));

        let json = serde_json::to_value(client.request_body(&LlmRequest::prompt("hi"))).unwrap();
        assert_eq!(json["max_tokens"], 2048);
        assert!((json["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);

        let explicit = LlmRequest::prompt("hi").with_temperature(0.0);
        let json = serde_json::to_value(client.request_body(&explicit)).unwrap();
        assert_eq!(json["temperature"], 0.0);
    }

    #[test]
    fn unset_params_are_omitted() {
        let client = OpenAiClient::new(OLLAMA_BASE_URL, "llama3", None);
        let json = serde_json::to_value(client.request_body(&LlmRequest::prompt("hi"))).unwrap();
        assert!(json.get("temperature").is_none());
        assert!(json.get("max_tokens").is_none());
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let client = OpenAiClient::new("https://api.groq.com/openai/", "m", None);
        assert_eq!(client.base_url, GROQ_BASE_URL);
    }

    #[tokio::test]
    async fn unreachable_provider_is_an_llm_error() {
        let client = OpenAiClient::new("http://127.0.0.1:9", "m", None);
        let err = client.complete(LlmRequest::prompt("hi")).await.unwrap_err();
        assert!(matches!(err, IdeaForgeError::Llm(_)));
    }
}
