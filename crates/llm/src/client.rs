use async_trait::async_trait;
use ideaforge_common::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmRequest {
    pub system_prompt: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl LlmRequest {
    /// Single-turn request carrying one user prompt.
    pub fn prompt(content: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage {
                role: Role::User,
                content: content.into(),
            }],
            ..Default::default()
        }
    }

    pub fn with_system(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Text of the last user message, if any.
    pub fn last_user_content(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub content: String,
    pub model: String,
    pub usage: Option<TokenUsage>,
    pub finish_reason: Option<String>,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse>;
    fn model_name(&self) -> &str;

    /// Send a single prompt and return the reply text.
    async fn ask(&self, prompt: String) -> Result<String> {
        Ok(self.complete(LlmRequest::prompt(prompt)).await?.content)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    struct Echo;

    #[async_trait]
    impl LlmClient for Echo {
        async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
            Ok(LlmResponse {
                content: format!("echo: {}", request.last_user_content().unwrap_or("")),
                model: "echo".into(),
                usage: None,
                finish_reason: Some("stop".into()),
            })
        }
        fn model_name(&self) -> &str {
            "echo"
        }
    }

    #[test]
    fn prompt_builds_single_user_message() {
        let request = LlmRequest::prompt("Assess this idea").with_temperature(0.7);
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, Role::User);
        assert_eq!(request.last_user_content(), Some("Assess this idea"));
        assert_eq!(request.temperature, Some(0.7));
        assert!(request.system_prompt.is_none());
    }

    #[tokio::test]
    async fn ask_returns_content() {
        let client: Arc<dyn LlmClient> = Arc::new(Echo);
        let reply = client.ask("hello".to_string()).await.unwrap();
        assert_eq!(reply, "echo: hello");
        assert_eq!(client.model_name(), "echo");
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::System).unwrap(), "\"system\"");
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            "\"assistant\""
        );
    }
}
