//! # recall-agent
//!
//! Conversational characters on top of [`recall_core`] memories and the
//! [`recall_llm`] client.
//!
//! A [`GenAgent`] owns one character's knowledge, memory engine, scene and
//! conversation history, and offers five interaction modes:
//!
//! | Mode        | Client call                 | Tools        | History        |
//! |-------------|-----------------------------|--------------|----------------|
//! | `interact`  | `tool_completion`           | actions      | on speech only |
//! | `chat`      | `plain_completion`          | none         | yes            |
//! | `act`       | `tool_completion`           | actions      | no             |
//! | `query`     | `forced_action_completion`  | `rate` (1–5) | no             |
//! | `guardrail` | `forced_action_completion`  | `rate` (1–5) | no             |

#![deny(clippy::unwrap_used)]
#![warn(missing_docs)]

pub mod agent;
pub mod keywords;
pub mod knowledge;
pub mod lore;
pub mod prompt;
pub mod telemetry;
pub mod tools;

pub use agent::{GenAgent, Interaction};
pub use knowledge::{Action, ActionParameter, AgentDef, Conversation, Knowledge, Lore, ParameterKind};
pub use lore::LoreMatch;
