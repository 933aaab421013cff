//! What a character knows: the game world, shared lore, its own definition,
//! and the conversation it is currently in.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use recall_core::Memory;

/// JSON-schema type of an action parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    /// Free text.
    #[default]
    String,
    /// Whole number.
    Integer,
    /// Any number.
    Number,
    /// True or false.
    Boolean,
}

impl ParameterKind {
    /// The JSON-schema type name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
        }
    }
}

/// One argument of an [`Action`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionParameter {
    /// Argument name.
    pub name: String,
    /// What the argument means, shown to the model.
    #[serde(default)]
    pub description: String,
    /// Argument type.
    #[serde(default, rename = "type")]
    pub kind: ParameterKind,
    /// If set, the only values the model may choose.
    #[serde(default)]
    pub allowed: Option<Vec<String>>,
}

/// Something a character can do in the game, offered to the model as a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Tool name.
    pub name: String,
    /// When the action applies, shown to the model.
    #[serde(default)]
    pub description: String,
    /// Tool arguments.
    #[serde(default)]
    pub parameters: Vec<ActionParameter>,
}

/// A character definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDef {
    /// Stable identifier, matched against [`Lore::known_by`].
    pub uuid: Uuid,
    /// Display name, also the speaker tag stripped from replies.
    pub name: String,
    /// Personality and background.
    #[serde(default)]
    pub description: String,
    /// Actions offered as tools.
    #[serde(default)]
    pub actions: Vec<Action>,
    /// Lore only this character knows.
    #[serde(default)]
    pub personal_lore: Vec<Memory>,
}

/// A piece of shared lore and the characters who know it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lore {
    /// The lore itself.
    pub memory: Memory,
    /// Characters who know it.
    #[serde(default)]
    pub known_by: Vec<Uuid>,
}

/// Everything a character knows outside of its memories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Knowledge {
    /// Setting description shared by every character.
    #[serde(default)]
    pub game_description: String,
    /// Lore shared between characters.
    #[serde(default)]
    pub shared_lore: Vec<Lore>,
    /// This character.
    pub agent_def: AgentDef,
}

impl Knowledge {
    /// Shared lore known by this character, followed by its personal lore
    /// flagged as personal.
    #[must_use]
    pub fn initial_memories(&self) -> Vec<Memory> {
        let uuid = self.agent_def.uuid;
        self.shared_lore
            .iter()
            .filter(|lore| lore.known_by.contains(&uuid))
            .map(|lore| lore.memory.clone())
            .chain(
                self.agent_def
                    .personal_lore
                    .iter()
                    .cloned()
                    .map(Memory::personal),
            )
            .collect()
    }
}

/// The scene a character is currently in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    /// Where and when the conversation happens.
    #[serde(default)]
    pub scene_description: String,
    /// Free-form direction for the character.
    #[serde(default)]
    pub instructions: String,
    /// How many memories go into each prompt.
    #[serde(default = "default_memories_to_include")]
    pub memories_to_include: usize,
}

impl Default for Conversation {
    fn default() -> Self {
        Self {
            scene_description: String::new(),
            instructions: String::new(),
            memories_to_include: default_memories_to_include(),
        }
    }
}

impl Conversation {
    /// Scene description followed by instructions.
    #[must_use]
    pub fn context_description(&self) -> String {
        format!("{}{}", self.scene_description, self.instructions)
    }
}

fn default_memories_to_include() -> usize {
    5
}
