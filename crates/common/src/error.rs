//! Error types for IdeaForge.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IdeaForgeError {
    /// Missing or invalid external configuration. Fatal at startup.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Agent error: {0}")]
    Agent(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IdeaForgeError {
    /// Whether the error came from a collaborator outside the process
    /// (model provider, search API, vector store).
    pub fn is_external(&self) -> bool {
        matches!(
            self,
            Self::Llm(_) | Self::Search(_) | Self::Store(_) | Self::Embedding(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, IdeaForgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_category() {
        let err = IdeaForgeError::Config("GROQ_API_KEY is not set".into());
        assert_eq!(err.to_string(), "Configuration error: GROQ_API_KEY is not set");
    }

    #[test]
    fn external_errors_are_classified() {
        assert!(IdeaForgeError::Llm("timeout".into()).is_external());
        assert!(IdeaForgeError::Store("503".into()).is_external());
        assert!(!IdeaForgeError::Validation("too short".into()).is_external());
        assert!(!IdeaForgeError::NotFound("idea 3".into()).is_external());
    }

    #[test]
    fn serde_errors_convert() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: IdeaForgeError = parse.unwrap_err().into();
        assert!(matches!(err, IdeaForgeError::Serialization(_)));
    }
}
