//! Core types for completion requests and responses.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Who authored a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The player / caller.
    User,
    /// The model speaking as the character.
    Assistant,
    /// Out-of-band instructions.
    System,
}

impl Role {
    /// Wire name used by chat-completion APIs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

/// A single role-tagged message. Immutable once appended to a history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Author of the message.
    pub role: Role,
    /// Text content.
    pub content: String,
}

impl Message {
    /// Create a message with an explicit role.
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }
}

/// A structured action chosen by the model.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ActionCompletion {
    /// Name of the invoked tool.
    pub action: String,
    /// Parsed arguments. Empty when the model sent a malformed payload.
    pub args: Map<String, Value>,
}

impl ActionCompletion {
    /// Look up a single argument.
    #[must_use]
    pub fn arg(&self, name: &str) -> Option<&Value> {
        self.args.get(name)
    }
}

/// Result of a completion that may or may not invoke a tool.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// Free text from the model.
    Message(Message),
    /// A tool invocation.
    Action(ActionCompletion),
}

impl Completion {
    /// The text message, if the model answered in prose.
    #[must_use]
    pub fn into_message(self) -> Option<Message> {
        match self {
            Completion::Message(m) => Some(m),
            Completion::Action(_) => None,
        }
    }

    /// The action, if the model invoked a tool.
    #[must_use]
    pub fn into_action(self) -> Option<ActionCompletion> {
        match self {
            Completion::Action(a) => Some(a),
            Completion::Message(_) => None,
        }
    }
}

/// A function the model may call, described with a JSON schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Function name.
    pub name: String,
    /// What the function does, shown to the model.
    pub description: String,
    /// JSON schema of the argument object.
    pub parameters: Value,
}

/// Whether the model may answer in prose or must call a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolChoice {
    /// Model decides.
    #[default]
    Auto,
    /// Model must call one of the offered tools.
    Required,
}

impl ToolChoice {
    /// Wire name used by chat-completion APIs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ToolChoice::Auto => "auto",
            ToolChoice::Required => "required",
        }
    }
}

/// A request to the completion provider.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompletionRequest {
    /// Ordered conversation.
    pub messages: Vec<Message>,
    /// Offered tools. Empty means a plain completion.
    pub tools: Vec<ToolSchema>,
    /// Tool-choice directive; ignored when `tools` is empty.
    pub tool_choice: ToolChoice,
    /// Sampling temperature override.
    pub temperature: Option<f32>,
    /// Output length cap.
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    /// Create a plain request over `messages`.
    #[must_use]
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            ..Self::default()
        }
    }

    /// Offer tools to the model.
    #[must_use]
    pub fn with_tools(mut self, tools: Vec<ToolSchema>, choice: ToolChoice) -> Self {
        self.tools = tools;
        self.tool_choice = choice;
        self
    }

    /// Set the temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Cap the output length.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// A raw tool invocation as returned by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCall {
    /// Invoked function name.
    pub name: String,
    /// JSON-encoded argument string, possibly malformed.
    pub arguments: String,
}

/// The first choice of a completion response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProviderReply {
    /// Text content, if any.
    pub content: Option<String>,
    /// First tool call, if any.
    pub tool_call: Option<ToolCall>,
}

impl ProviderReply {
    /// A prose reply.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_call: None,
        }
    }

    /// A tool-call reply.
    #[must_use]
    pub fn tool_call(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            content: None,
            tool_call: Some(ToolCall {
                name: name.into(),
                arguments: arguments.into(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_serialize_lowercase() {
        let json = serde_json::to_string(&Message::system("hi")).expect("serialize");
        assert_eq!(json, r#"{"role":"system","content":"hi"}"#);
    }

    #[test]
    fn completion_accessors() {
        let msg = Completion::Message(Message::assistant("hello"));
        assert!(msg.clone().into_action().is_none());
        assert_eq!(msg.into_message().map(|m| m.content), Some("hello".to_string()));
    }
}
