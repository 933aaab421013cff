//! Scripted provider for deterministic testing.
//!
//! Returns pre-configured replies without making any HTTP calls and records
//! every request it receives.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::LlmError;
use crate::provider::{CompletionProvider, EmbeddingProvider};
use crate::types::{CompletionRequest, ProviderReply};

/// Text returned once the reply queue runs dry.
pub const EXHAUSTED_SCRIPT_REPLY: &str = "(mock: no more scripted replies)";

/// One scripted completion outcome.
#[derive(Debug, Clone)]
pub enum Scripted {
    /// Answer in prose.
    Text(String),
    /// Call a tool with a raw (possibly malformed) argument string.
    ToolCall {
        /// Function name.
        name: String,
        /// Raw JSON argument string.
        arguments: String,
    },
    /// Fail the request.
    Error(String),
}

/// A completion + embedding provider driven by a reply queue.
///
/// Keyed replies (matched on the first message of a request) take
/// precedence over the queue and are never consumed, which keeps concurrent
/// fan-out tests independent of scheduling order.
///
/// Embeddings come from an explicit text → vector table, falling back to a
/// deterministic letter-histogram vector so similar texts land close together.
#[derive(Clone)]
pub struct ScriptedProvider {
    replies: Arc<Mutex<VecDeque<Scripted>>>,
    keyed: Arc<Mutex<HashMap<String, Scripted>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
    embeddings: Arc<Mutex<HashMap<String, Vec<f32>>>>,
    embed_calls: Arc<Mutex<Vec<String>>>,
    failing_embeddings: Arc<Mutex<Vec<String>>>,
    dims: usize,
}

impl ScriptedProvider {
    /// Create a provider with an empty script and 8-dimensional embeddings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_dimensions(8)
    }

    /// Create a provider producing `dims`-dimensional embeddings.
    #[must_use]
    pub fn with_dimensions(dims: usize) -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::new())),
            keyed: Arc::new(Mutex::new(HashMap::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            embeddings: Arc::new(Mutex::new(HashMap::new())),
            embed_calls: Arc::new(Mutex::new(Vec::new())),
            failing_embeddings: Arc::new(Mutex::new(Vec::new())),
            dims: dims.max(1),
        }
    }

    /// Queue a prose reply.
    #[must_use]
    pub fn with_text(self, text: &str) -> Self {
        self.push(Scripted::Text(text.to_string()));
        self
    }

    /// Queue a tool call with a raw argument string.
    #[must_use]
    pub fn with_tool_call(self, name: &str, arguments: &str) -> Self {
        self.push(Scripted::ToolCall {
            name: name.to_string(),
            arguments: arguments.to_string(),
        });
        self
    }

    /// Queue a provider failure.
    #[must_use]
    pub fn with_error(self, error: &str) -> Self {
        self.push(Scripted::Error(error.to_string()));
        self
    }

    /// Always answer `reply` to requests whose first message is `first_message`.
    #[must_use]
    pub fn with_reply_to(self, first_message: &str, reply: Scripted) -> Self {
        self.keyed.lock().insert(first_message.to_string(), reply);
        self
    }

    /// Pin the embedding returned for `text`.
    #[must_use]
    pub fn with_embedding(self, text: &str, vector: Vec<f32>) -> Self {
        self.embeddings.lock().insert(text.to_string(), vector);
        self
    }

    /// Make embedding `text` fail.
    #[must_use]
    pub fn with_failing_embedding(self, text: &str) -> Self {
        self.failing_embeddings.lock().push(text.to_string());
        self
    }

    /// Queue a reply through a shared reference.
    pub fn push(&self, reply: Scripted) {
        self.replies.lock().push_back(reply);
    }

    /// Every completion request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().clone()
    }

    /// Number of completion requests received so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Every text embedded so far, in call order.
    #[must_use]
    pub fn embedded_texts(&self) -> Vec<String> {
        self.embed_calls.lock().clone()
    }

    /// Replies still queued.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.replies.lock().len()
    }

    fn next_reply(&self, request: &CompletionRequest) -> Scripted {
        let keyed = request
            .messages
            .first()
            .and_then(|m| self.keyed.lock().get(&m.content).cloned());
        if let Some(reply) = keyed {
            return reply;
        }
        self.replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Scripted::Text(EXHAUSTED_SCRIPT_REPLY.to_string()))
    }

    fn histogram(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; self.dims];
        for c in text.chars().filter(char::is_ascii_alphabetic) {
            let bucket = (c.to_ascii_lowercase() as usize - 'a' as usize) % self.dims;
            vector[bucket] += 1.0;
        }
        vector
    }
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<ProviderReply, LlmError> {
        self.requests.lock().push(request.clone());
        match self.next_reply(request) {
            Scripted::Text(text) => Ok(ProviderReply::text(text)),
            Scripted::ToolCall { name, arguments } => Ok(ProviderReply::tool_call(name, arguments)),
            Scripted::Error(error) => Err(LlmError::RequestFailed(error)),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for ScriptedProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        self.embed_calls.lock().push(text.to_string());
        if self.failing_embeddings.lock().iter().any(|t| t == text) {
            return Err(LlmError::Unavailable(format!("scripted embedding failure for '{text}'")));
        }
        if let Some(vector) = self.embeddings.lock().get(text) {
            return Ok(vector.clone());
        }
        Ok(self.histogram(text))
    }

    fn dimensions(&self) -> usize {
        self.dims
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Message;

    #[tokio::test]
    async fn replies_in_queue_order_then_placeholder() {
        let provider = ScriptedProvider::new().with_text("one").with_error("down");
        let request = CompletionRequest::new(vec![Message::user("hi")]);

        let first = provider.complete(&request).await.expect("first");
        assert_eq!(first.content.as_deref(), Some("one"));
        assert!(provider.complete(&request).await.is_err());
        let third = provider.complete(&request).await.expect("third");
        assert_eq!(third.content.as_deref(), Some(EXHAUSTED_SCRIPT_REPLY));
        assert_eq!(provider.request_count(), 3);
    }

    #[tokio::test]
    async fn histogram_embeddings_are_deterministic() {
        let provider = ScriptedProvider::with_dimensions(4);
        let a = provider.embed("sword").await.expect("embed");
        let b = provider.embed("sword").await.expect("embed");
        assert_eq!(a, b);
        assert_eq!(a.len(), 4);
        assert_eq!(a.iter().sum::<f32>(), 5.0);
    }
}
