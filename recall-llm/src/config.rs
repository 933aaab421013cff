//! LLM provider configuration: the `[llm]` section of `recall.toml`.

use serde::{Deserialize, Serialize};

/// Which backend serves completions and embeddings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// OpenAI-compatible API (also works with Azure, Together, vLLM, etc.).
    #[serde(rename = "openai", alias = "openai_compatible")]
    OpenAi,
    /// No LLM available: every call fails with `Unavailable`.
    None,
}

/// LLM integration configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider backend.
    #[serde(default = "default_provider")]
    pub provider: ProviderKind,
    /// Base URL for the API, without the endpoint path.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Inline credential. Takes precedence over `api_key_env`.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Environment variable holding the credential.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Chat model name.
    #[serde(default = "default_model")]
    pub model: String,
    /// Embedding model name.
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    /// Embedding vector dimensions.
    #[serde(default = "default_1536")]
    pub embedding_dimensions: usize,
    /// Timeout applied to every outbound call.
    #[serde(default = "default_30000")]
    pub request_timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::OpenAi,
            base_url: default_base_url(),
            api_key: None,
            api_key_env: default_api_key_env(),
            model: default_model(),
            embedding_model: default_embedding_model(),
            embedding_dimensions: 1536,
            request_timeout_ms: 30_000,
        }
    }
}

impl LlmConfig {
    /// Resolve the credential from the inline value or the environment.
    #[must_use]
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var(&self.api_key_env).ok().filter(|k| !k.is_empty()))
    }
}

fn default_provider() -> ProviderKind { ProviderKind::OpenAi }
fn default_base_url() -> String { "https://api.openai.com/v1".to_string() }
fn default_api_key_env() -> String { "OPENAI_API_KEY".to_string() }
fn default_model() -> String { "gpt-4".to_string() }
fn default_embedding_model() -> String { "text-embedding-ada-002".to_string() }
fn default_1536() -> usize { 1536 }
fn default_30000() -> u64 { 30_000 }
