//! Exact cosine-similarity scan over every stored memory.

use parking_lot::RwLock;

use super::{VectorStore, require_embedding};
use crate::error::Result;
use crate::types::{Memory, ScoredMemory};

/// A linear-scan store. Exact, and fast enough for a few hundred memories
/// per character.
#[derive(Debug, Default)]
pub struct BruteForceStore {
    memories: RwLock<Vec<Memory>>,
}

impl BruteForceStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored memories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.memories.read().len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.memories.read().is_empty()
    }
}

impl VectorStore for BruteForceStore {
    fn add(&self, memory: Memory) -> Result<()> {
        require_embedding(&memory)?;
        self.memories.write().push(memory);
        Ok(())
    }

    fn top_k(&self, query: &Memory, k: usize) -> Result<Vec<ScoredMemory>> {
        let query = require_embedding(query)?;
        let memories = self.memories.read();

        let mut scored: Vec<ScoredMemory> = memories
            .iter()
            .filter_map(|m| {
                let embedding = m.embedding.as_ref()?;
                Some(ScoredMemory::new(m.clone(), query.cosine_similarity(embedding)))
            })
            .collect();

        // Stable: equal scores keep insertion order.
        scored.sort_by(|a, b| b.score.cmp(&a.score));
        scored.truncate(k);
        Ok(scored)
    }

    fn all(&self) -> Result<Vec<Memory>> {
        Ok(self.memories.read().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RecallError;

    fn embedded(description: &str, values: &[f32]) -> Memory {
        Memory::new(description).with_embedding(values.to_vec())
    }

    #[test]
    fn empty_store_returns_nothing() {
        let store = BruteForceStore::new();
        let hits = store.top_k(&embedded("q", &[1.0, 0.0]), 3).expect("top_k");
        assert!(hits.is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn ranks_by_cosine_similarity() {
        let store = BruteForceStore::new();
        store.add(embedded("east", &[1.0, 0.0])).expect("add");
        store.add(embedded("north", &[0.0, 1.0])).expect("add");
        store.add(embedded("north-east", &[0.7, 0.7])).expect("add");

        let hits = store.top_k(&embedded("q", &[1.0, 0.1]), 2).expect("top_k");

        let names: Vec<&str> = hits.iter().map(|h| h.memory.description.as_str()).collect();
        assert_eq!(names, vec!["east", "north-east"]);
        assert!(hits[0].score >= hits[1].score);
    }

    #[test]
    fn rejects_unembedded_memories_and_queries() {
        let store = BruteForceStore::new();
        assert!(matches!(
            store.add(Memory::new("bare")),
            Err(RecallError::MissingEmbedding { .. })
        ));
        assert!(matches!(
            store.top_k(&Memory::new("q"), 1),
            Err(RecallError::MissingEmbedding { .. })
        ));
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn all_preserves_insertion_order() {
        let store = BruteForceStore::new();
        store.add(embedded("first", &[1.0])).expect("add");
        store.add(embedded("second", &[1.0])).expect("add");

        let all = store.all().expect("all");
        assert_eq!(all[0].description, "first");
        assert_eq!(all[1].description, "second");
    }
}
