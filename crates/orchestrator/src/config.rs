//! Configuration for the analysis service.
//!
//! Values come from an optional TOML file, then environment variables
//! override them. Secrets are expected in the environment; a key found in
//! the file is accepted but warned about.

use std::net::SocketAddr;
use std::path::Path;

use anyhow::Context;

use ideaforge_agents::SearchConfig;
use ideaforge_common::{IdeaForgeError, Result};
use ideaforge_llm::LlmConfig;
use ideaforge_memory::{MemoryConfig, StoreBackend};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default = "default_app_version")]
    pub app_version: String,
}

fn default_host() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    8000
}

fn default_app_name() -> String {
    "IdeaForge Startup Feasibility Engine".into()
}

fn default_app_version() -> String {
    env!("CARGO_PKG_VERSION").into()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            app_name: default_app_name(),
            app_version: default_app_version(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Resolve `host:port` to a socket address. Hostnames such as
    /// `localhost` are looked up; the first address wins.
    pub async fn resolve_bind_addr(&self) -> anyhow::Result<SocketAddr> {
        let bind = self.bind_addr();
        tokio::net::lookup_host(bind.as_str())
            .await
            .with_context(|| format!("invalid server bind address HOST:PORT={bind:?}"))?
            .next()
            .with_context(|| format!("server bind address {bind:?} resolved to nothing"))
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| IdeaForgeError::Config(format!("invalid {name}={raw:?}: {e}")))
}

impl OrchestratorConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();

        #[cfg(unix)]
        validate_config_file_permissions(path)?;

        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;

        if config.llm.api_key.is_some() || config.memory.supabase_key.is_some() {
            warn!(
                "Secret found in config file '{}'. Prefer environment variables \
                 (GROQ_API_KEY, OPENAI_API_KEY, SUPABASE_KEY).",
                path.display()
            );
        }

        Ok(config)
    }

    /// File (or defaults) overlaid with the process environment. Callers
    /// load `.env` first and run [`OrchestratorConfig::validate`] after any
    /// command-line overrides.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Override fields from environment-style variables. Blank values are
    /// ignored; unparseable numbers are configuration errors.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = self.llm.api_key_env().and_then(|name| get(name)) {
            self.llm.api_key = Some(key);
        }
        if let Some(model) = get("LLM_MODEL") {
            self.llm.model = model;
        }
        if let Some(raw) = get("LLM_TEMPERATURE") {
            self.llm.temperature = Some(parse_env("LLM_TEMPERATURE", &raw)?);
        }

        if let Some(url) = get("SUPABASE_URL") {
            self.memory.supabase_url = Some(url);
        }
        if let Some(key) = get("SUPABASE_KEY") {
            self.memory.supabase_key = Some(key);
        }
        if let Some(raw) = get("TOP_K_SIMILAR") {
            self.memory.top_k = parse_env("TOP_K_SIMILAR", &raw)?;
        }

        if let Some(name) = get("APP_NAME") {
            self.server.app_name = name;
        }
        if let Some(version) = get("APP_VERSION") {
            self.server.app_version = version;
        }

        Ok(())
    }

    /// Check that every credential the configured backends need is present.
    pub fn validate(&self) -> Result<()> {
        if let Some(env_var) = self.llm.api_key_env() {
            let has_key = self
                .llm
                .api_key
                .as_deref()
                .is_some_and(|k| !k.trim().is_empty());
            if !has_key {
                return Err(IdeaForgeError::Config(format!(
                    "{} provider requires an API key (set {env_var})",
                    self.llm.provider
                )));
            }
        }

        if self.memory.backend == StoreBackend::Supabase
            && (self.memory.supabase_url.is_none() || self.memory.supabase_key.is_none())
        {
            return Err(IdeaForgeError::Config(
                "Supabase store requires SUPABASE_URL and SUPABASE_KEY".into(),
            ));
        }

        if self.memory.top_k == 0 {
            return Err(IdeaForgeError::Config("TOP_K_SIMILAR must be at least 1".into()));
        }

        Ok(())
    }
}

/// Reject world-writable config files and warn when a file holding a
/// secret is readable by others.
#[cfg(unix)]
fn validate_config_file_permissions(path: &Path) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = std::fs::metadata(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e))?;

    if !metadata.is_file() {
        anyhow::bail!("Config path '{}' is not a regular file", path.display());
    }

    let permission_bits = metadata.permissions().mode() & 0o777;
    if permission_bits & 0o002 != 0 {
        anyhow::bail!(
            "Config file '{}' is world-writable (mode {:04o}). Fix with: chmod o-w {}",
            path.display(),
            permission_bits,
            path.display()
        );
    }

    let content = std::fs::read_to_string(path)?;
    let has_secret = content.contains("api_key") || content.contains("supabase_key");
    if has_secret && permission_bits & 0o044 != 0 {
        warn!(
            "Config file '{}' contains a secret and is readable by others (mode {:04o}). \
             Consider: chmod 600 {}",
            path.display(),
            permission_bits,
            path.display()
        );
    }

    Ok(())
}
