//! Lore tracing: which stored lore a reply draws on.

use serde::Serialize;

use recall_core::Memory;
use recall_core::embedding::{cosine_similarity, euclidean_distance};
use recall_core::Embedding;

/// Fragments this short (in characters) carry no meaning worth tracing.
const MIN_FRAGMENT_CHARS: usize = 3;

/// Sentence and clause delimiters, ASCII and full-width.
const DELIMITERS: [char; 8] = [',', '.', '?', '!', '，', '。', '？', '！'];

/// Split `content` into trimmed sentence fragments longer than three characters.
#[must_use]
pub fn split_sentences(content: &str) -> Vec<&str> {
    content
        .split(DELIMITERS)
        .map(str::trim)
        .filter(|fragment| fragment.chars().count() > MIN_FRAGMENT_CHARS)
        .collect()
}

/// One stored memory retrieved for one reply fragment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoreMatch {
    /// The reply fragment used as the query.
    pub fragment: String,
    /// The retrieved memory's description.
    pub description: String,
    /// The retrieved memory's external id, if it has one.
    pub client_id: Option<String>,
    /// Cosine similarity between fragment and memory.
    pub similarity: f32,
    /// Euclidean distance between fragment and memory.
    pub distance: f32,
}

impl LoreMatch {
    /// Compare a fragment embedding against a retrieved memory.
    ///
    /// `None` if the memory has no embedding or the dimensions differ.
    #[must_use]
    pub fn measure(fragment: &str, fragment_embedding: &Embedding, memory: &Memory) -> Option<Self> {
        let embedding = memory.embedding.as_ref()?;
        let distance = euclidean_distance(embedding, fragment_embedding)?;
        Some(Self {
            fragment: fragment.to_string(),
            description: memory.description.clone(),
            client_id: memory.client_id.clone(),
            similarity: cosine_similarity(embedding, fragment_embedding),
            distance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_ascii_and_full_width_punctuation() {
        let fragments = split_sentences("The bridge is out, sadly. Who did it？我不知道！ Ok.");
        assert_eq!(fragments, vec!["The bridge is out", "sadly", "Who did it", "我不知道"]);
    }

    #[test]
    fn drops_short_fragments() {
        assert!(split_sentences("Yes. No! Hm?").is_empty());
        assert_eq!(split_sentences("Aye, indeed"), vec!["indeed"]);
    }

    #[test]
    fn measures_similarity_and_distance() {
        let memory = Memory::new("The bridge is out")
            .with_embedding(vec![3.0, 4.0])
            .with_client_id("lore-7");
        let found = LoreMatch::measure("bridge", &Embedding(vec![0.0, 0.0]), &memory)
            .expect("comparable");

        assert_eq!(found.client_id.as_deref(), Some("lore-7"));
        assert!((found.distance - 5.0).abs() < 1e-6);
        assert_eq!(found.similarity, 0.0);
    }

    #[test]
    fn unembedded_memory_is_not_measured() {
        let memory = Memory::new("bare");
        assert!(LoreMatch::measure("x", &Embedding(vec![1.0]), &memory).is_none());
    }
}
