//! Provider boundaries: completion and embedding backends.

use async_trait::async_trait;

use crate::error::LlmError;
use crate::types::{CompletionRequest, ProviderReply};

/// A chat-completion backend.
///
/// Implementations hold no per-call mutable state, so one instance is
/// shared by every character and every concurrent call.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Human-readable name, e.g. "openai".
    fn name(&self) -> &str;

    /// Send one completion request and return the first choice.
    async fn complete(&self, request: &CompletionRequest) -> Result<ProviderReply, LlmError>;
}

/// A text-embedding backend.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError>;

    /// Length of every vector this provider returns, `0` if unknown.
    /// [`LlmClient::embed`](crate::LlmClient::embed) rejects vectors of any other length.
    fn dimensions(&self) -> usize;
}

/// Backend used when no LLM is configured. Every call fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProvider;

#[async_trait]
impl CompletionProvider for NullProvider {
    fn name(&self) -> &str {
        "none"
    }

    async fn complete(&self, _request: &CompletionRequest) -> Result<ProviderReply, LlmError> {
        Err(LlmError::Unavailable("No LLM provider configured".into()))
    }
}

#[async_trait]
impl EmbeddingProvider for NullProvider {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, LlmError> {
        Err(LlmError::Unavailable("No embedding provider configured".into()))
    }

    fn dimensions(&self) -> usize {
        0
    }
}
