//! Core type definitions for the recall memory system.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Memory Embedding Vector
// ---------------------------------------------------------------------------

/// A dense vector embedding for semantic similarity search.
/// 1536 dimensions for `text-embedding-ada-002`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Embedding(pub Vec<f32>);

impl Embedding {
    /// Cosine similarity between two embeddings.
    /// Returns 0.0 if either vector is zero-length or the dimensions differ.
    #[must_use]
    pub fn cosine_similarity(&self, other: &Self) -> f32 {
        if self.0.len() != other.0.len() || self.0.is_empty() {
            return 0.0;
        }
        let (mut dot, mut norm_a, mut norm_b) = (0.0_f32, 0.0_f32, 0.0_f32);
        for (a, b) in self.0.iter().zip(other.0.iter()) {
            dot += a * b;
            norm_a += a * a;
            norm_b += b * b;
        }
        let denom = norm_a.sqrt() * norm_b.sqrt();
        if denom < f32::EPSILON {
            0.0
        } else {
            dot / denom
        }
    }

    /// Dimensionality of the embedding.
    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.0.len()
    }
}

impl From<Vec<f32>> for Embedding {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

// ---------------------------------------------------------------------------
// Memory
// ---------------------------------------------------------------------------

/// A stored fact, piece of lore or utterance associated with a character.
///
/// `description` is the identity key: two memories with the same description
/// are the same memory as far as ranking is concerned.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Memory {
    /// The memory text.
    pub description: String,
    /// Lazily computed embedding of `description`.
    #[serde(default)]
    pub embedding: Option<Embedding>,
    /// Poignancy, 1–10 once rated. `0` means unrated.
    #[serde(default)]
    pub importance: u8,
    /// Terms to highlight when they appear in a reply.
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
    /// External correlation id (e.g. a lore entry in the authoring tool).
    #[serde(default)]
    pub client_id: Option<String>,
    /// Character-private lore rather than shared lore.
    #[serde(default, alias = "isPersonal")]
    pub is_personal: bool,
}

impl Memory {
    /// Create an unrated, unembedded memory.
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Self::default()
        }
    }

    /// Attach a precomputed embedding.
    #[must_use]
    pub fn with_embedding(mut self, embedding: impl Into<Embedding>) -> Self {
        self.embedding = Some(embedding.into());
        self
    }

    /// Set the importance (0 leaves it unrated).
    #[must_use]
    pub fn with_importance(mut self, importance: u8) -> Self {
        self.importance = importance;
        self
    }

    /// Set highlight keywords.
    #[must_use]
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = Some(keywords.into_iter().map(Into::into).collect());
        self
    }

    /// Set the external correlation id.
    #[must_use]
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Mark as character-private lore.
    #[must_use]
    pub fn personal(mut self) -> Self {
        self.is_personal = true;
        self
    }

    /// Whether an importance rating is still needed.
    #[must_use]
    pub fn is_unrated(&self) -> bool {
        self.importance == 0
    }

    /// Whether an embedding still has to be computed. An empty vector counts
    /// as missing.
    #[must_use]
    pub fn needs_embedding(&self) -> bool {
        self.embedding.as_ref().is_none_or(|e| e.0.is_empty())
    }
}

impl fmt::Display for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

// ---------------------------------------------------------------------------
// Retrieval Score
// ---------------------------------------------------------------------------

/// Similarity score used to rank memories. Higher is more relevant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct RetrievalScore(pub OrderedFloat<f32>);

impl RetrievalScore {
    /// Create a retrieval score from a raw f32.
    #[must_use]
    pub fn new(score: f32) -> Self {
        Self(OrderedFloat(score))
    }

    /// Get the raw score value.
    #[must_use]
    pub fn value(self) -> f32 {
        self.0.into_inner()
    }
}

/// A (memory, score) pair produced by a store for one query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredMemory {
    /// The candidate memory.
    pub memory: Memory,
    /// Its similarity to the query.
    pub score: RetrievalScore,
}

impl ScoredMemory {
    /// Pair a memory with a raw score.
    #[must_use]
    pub fn new(memory: Memory, score: f32) -> Self {
        Self {
            memory,
            score: RetrievalScore::new(score),
        }
    }
}
