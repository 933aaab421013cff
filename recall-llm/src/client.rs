//! LLM Client: embeddings, completions and the bounded-retry protocols.

use std::sync::Arc;

use futures::future::join_all;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::{LlmConfig, ProviderKind};
use crate::error::LlmError;
use crate::openai::OpenAiProvider;
use crate::prompt::{NOT_A_DIGIT, NOT_A_FUNCTION_CALL};
use crate::provider::{CompletionProvider, EmbeddingProvider, NullProvider};
use crate::retry::{MAX_PROTOCOL_ATTEMPTS, RetryProtocol};
use crate::types::{
    ActionCompletion, Completion, CompletionRequest, Message, ToolCall, ToolChoice, ToolSchema,
};

/// Returned by [`LlmClient::digit_completion`] when no digit was obtained.
/// Distinct from a valid `0`.
pub const DIGIT_UNAVAILABLE: i32 = -1;

/// The client every model call goes through.
///
/// Holds no per-call mutable state; share it behind an `Arc`.
#[derive(Clone)]
pub struct LlmClient {
    completions: Arc<dyn CompletionProvider>,
    embeddings: Arc<dyn EmbeddingProvider>,
}

impl LlmClient {
    /// Create a client whose completions and embeddings share one backend.
    #[must_use]
    pub fn from_provider<P>(provider: Arc<P>) -> Self
    where
        P: CompletionProvider + EmbeddingProvider + 'static,
    {
        Self {
            completions: provider.clone(),
            embeddings: provider,
        }
    }

    /// Create a client with no LLM backend (all calls fail).
    #[must_use]
    pub fn none() -> Self {
        Self::from_provider(Arc::new(NullProvider))
    }

    /// Build the configured backend.
    ///
    /// # Errors
    /// Returns [`LlmError::ConfigError`] if the backend cannot be built.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        match config.provider {
            ProviderKind::OpenAi => Ok(Self::from_provider(Arc::new(
                OpenAiProvider::from_config(config)?,
            ))),
            ProviderKind::None => Ok(Self::none()),
        }
    }

    /// Name of the completion backend.
    #[must_use]
    pub fn provider_name(&self) -> &str {
        self.completions.name()
    }

    /// Embed `text`. Not retried.
    ///
    /// # Errors
    /// Propagates any provider failure. Returns
    /// [`LlmError::DimensionMismatch`] if the vector's length differs from the
    /// provider's declared dimensions.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let vector = self.embeddings.embed(text).await?;
        let expected = self.embeddings.dimensions();
        if expected > 0 && vector.len() != expected {
            return Err(LlmError::DimensionMismatch {
                expected,
                actual: vector.len(),
            });
        }
        Ok(vector)
    }

    /// One completion without tools, wrapped as an assistant message. Not retried.
    ///
    /// # Errors
    /// Propagates any provider failure.
    pub async fn plain_completion(&self, messages: &[Message]) -> Result<Message, LlmError> {
        let request = CompletionRequest::new(messages.to_vec());
        let reply = self.completions.complete(&request).await?;
        Ok(Message::assistant(reply.content.unwrap_or_default()))
    }

    /// One completion offering `tools`. With no tools this is exactly
    /// [`plain_completion`](Self::plain_completion).
    ///
    /// # Errors
    /// Propagates any provider failure. Malformed tool arguments are not an
    /// error: they become an empty mapping.
    pub async fn tool_completion(
        &self,
        messages: &[Message],
        tools: &[ToolSchema],
    ) -> Result<Completion, LlmError> {
        if tools.is_empty() {
            return self.plain_completion(messages).await.map(Completion::Message);
        }

        let request = CompletionRequest::new(messages.to_vec())
            .with_tools(tools.to_vec(), ToolChoice::Auto);
        let reply = self.completions.complete(&request).await?;

        Ok(match reply.tool_call {
            Some(call) => Completion::Action(action_from_call(call)),
            None => Completion::Message(Message::assistant(reply.content.unwrap_or_default())),
        })
    }

    /// Require the model to call one of `tools`.
    ///
    /// Up to [`MAX_PROTOCOL_ATTEMPTS`] attempts. Prose answers are fed back
    /// with a correction prompt; provider failures consume an attempt.
    /// Returns `None` when every attempt failed: the agent chose not to act.
    pub async fn forced_action_completion(
        &self,
        messages: &[Message],
        tools: &[ToolSchema],
    ) -> Option<ActionCompletion> {
        let mut conversation = messages.to_vec();
        let mut protocol = RetryProtocol::new(MAX_PROTOCOL_ATTEMPTS);

        while let Some(attempt) = protocol.next_attempt() {
            let request = CompletionRequest::new(conversation.clone())
                .with_tools(tools.to_vec(), ToolChoice::Required);

            match self.completions.complete(&request).await {
                Ok(reply) => match reply.tool_call {
                    Some(call) => protocol.succeed(action_from_call(call)),
                    None => {
                        debug!(attempt, "model answered in prose where a function call was required");
                        conversation.push(Message::assistant(reply.content.unwrap_or_default()));
                        conversation.push(Message::system(NOT_A_FUNCTION_CALL));
                        protocol.fail();
                    }
                },
                Err(e) => {
                    warn!(attempt, error = %e, "forced action request failed");
                    protocol.fail();
                }
            }
        }

        let attempts = protocol.attempts_made();
        let result = protocol.into_result();
        if result.is_none() {
            warn!(attempts, "no function call after all attempts; treating as no action");
        }
        result
    }

    /// Require a single-digit answer.
    ///
    /// Up to [`MAX_PROTOCOL_ATTEMPTS`] attempts at temperature 0 with a
    /// one-token cap. The first decimal digit in the reply wins. Returns
    /// [`DIGIT_UNAVAILABLE`] when every attempt failed.
    pub async fn digit_completion(&self, messages: &[Message]) -> i32 {
        let mut conversation = messages.to_vec();
        let mut protocol = RetryProtocol::new(MAX_PROTOCOL_ATTEMPTS);

        while let Some(attempt) = protocol.next_attempt() {
            let request = CompletionRequest::new(conversation.clone())
                .with_temperature(0.0)
                .with_max_tokens(1);

            match self.completions.complete(&request).await {
                Ok(reply) => {
                    let text = reply.content.unwrap_or_default();
                    match first_digit(&text) {
                        Some(digit) => protocol.succeed(digit),
                        None => {
                            debug!(attempt, answer = %text, "model answer was not a digit");
                            conversation.push(Message::assistant(text));
                            conversation.push(Message::system(NOT_A_DIGIT));
                            protocol.fail();
                        }
                    }
                }
                Err(e) => {
                    warn!(attempt, error = %e, "digit request failed");
                    protocol.fail();
                }
            }
        }

        let attempts = protocol.attempts_made();
        protocol.into_result().unwrap_or_else(|| {
            warn!(attempts, "no digit after all attempts");
            DIGIT_UNAVAILABLE
        })
    }

    /// Run [`digit_completion`](Self::digit_completion) concurrently over
    /// independent conversations. Output order matches input order.
    pub async fn digit_completion_batch(&self, query_groups: &[Vec<Message>]) -> Vec<i32> {
        join_all(
            query_groups
                .iter()
                .map(|messages| self.digit_completion(messages)),
        )
        .await
    }
}

/// Code points of `0` in each supported decimal digit block. Every block is
/// ten consecutive code points, `0` through `9`.
const DIGIT_ZEROS: [u32; 37] = [
    0x0030, 0x0660, 0x06F0, 0x07C0, 0x0966, 0x09E6, 0x0A66, 0x0AE6, 0x0B66, 0x0BE6, 0x0C66,
    0x0CE6, 0x0D66, 0x0DE6, 0x0E50, 0x0ED0, 0x0F20, 0x1040, 0x1090, 0x17E0, 0x1810, 0x1946,
    0x19D0, 0x1A80, 0x1A90, 0x1B50, 0x1BB0, 0x1C40, 0x1C50, 0xA620, 0xA8D0, 0xA900, 0xA9D0,
    0xA9F0, 0xAA50, 0xABF0, 0xFF10,
];

/// Value of `c` if it is a decimal digit: ASCII, full-width, or one of the
/// script digit blocks in [`DIGIT_ZEROS`].
fn decimal_value(c: char) -> Option<i32> {
    let code = u32::from(c);
    DIGIT_ZEROS
        .iter()
        .find(|&&zero| (zero..zero + 10).contains(&code))
        .and_then(|&zero| i32::try_from(code - zero).ok())
}

/// First decimal digit in `text`.
#[must_use]
pub fn first_digit(text: &str) -> Option<i32> {
    text.chars().find_map(decimal_value)
}

/// Parse a tool-call argument payload.
///
/// # Errors
/// Returns [`LlmError::ParseError`] if the payload is not a JSON object.
pub fn parse_arguments(raw: &str) -> Result<Map<String, Value>, LlmError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(LlmError::ParseError(format!(
            "tool arguments are not an object: {other}"
        ))),
        Err(e) => Err(LlmError::ParseError(format!("{e}: raw arguments: '{raw}'"))),
    }
}

fn action_from_call(call: ToolCall) -> ActionCompletion {
    let args = parse_arguments(&call.arguments).unwrap_or_else(|e| {
        warn!(action = %call.name, error = %e, "malformed tool arguments; using empty mapping");
        Map::new()
    });
    ActionCompletion {
        action: call.name,
        args,
    }
}
