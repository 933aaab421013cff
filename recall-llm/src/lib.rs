//! # recall-llm: LLM Client for recall
//!
//! The sole conduit to the embedding and completion providers. Every model
//! call made by the memory engine and the agent orchestrator goes through
//! [`LlmClient`], which enforces the retry/degradation policy:
//!
//!   - Malformed tool-call arguments degrade to an empty mapping
//!   - Forced tool calls retry with a correction prompt, then yield `None`
//!   - Single-digit answers retry with a correction prompt, then yield `-1`
//!   - Embeddings and plain completions are never retried
//!
//! # Architecture
//!
//! ```text
//! LlmHandle (lazy, resettable)
//!   └── LlmClient (retry protocols)
//!         ├── CompletionProvider  ── OpenAiProvider | NullProvider | ScriptedProvider
//!         └── EmbeddingProvider   ── OpenAiProvider | NullProvider | ScriptedProvider
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod handle;
pub mod mock;
pub mod openai;
pub mod prompt;
pub mod provider;
pub mod retry;
pub mod types;

pub use client::LlmClient;
pub use config::LlmConfig;
pub use error::LlmError;
pub use handle::LlmHandle;
pub use provider::{CompletionProvider, EmbeddingProvider, NullProvider};
pub use types::{
    ActionCompletion, Completion, CompletionRequest, Message, ProviderReply, Role, ToolCall,
    ToolChoice, ToolSchema,
};
