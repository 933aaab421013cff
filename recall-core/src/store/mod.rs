//! Vector store boundary.
//!
//! A store indexes embedded memories and answers "top-k most similar to this
//! query" with scored candidates. It serializes its own writes; the memory
//! engine adds no locking of its own.

mod brute_force;
mod hnsw;

use std::sync::Arc;

use crate::config::{MemoryConfig, StoreKind};
use crate::error::{RecallError, Result};
use crate::types::{Embedding, Memory, ScoredMemory};

pub use brute_force::BruteForceStore;
pub use hnsw::HnswStore;

/// An index of embedded memories.
pub trait VectorStore: Send + Sync {
    /// Index a memory. The memory must already carry an embedding.
    ///
    /// # Errors
    /// Returns [`RecallError::MissingEmbedding`] if it does not.
    fn add(&self, memory: Memory) -> Result<()>;

    /// The `k` stored memories most similar to `query`, best first.
    ///
    /// # Errors
    /// Returns [`RecallError::MissingEmbedding`] if `query` has no embedding.
    fn top_k(&self, query: &Memory, k: usize) -> Result<Vec<ScoredMemory>>;

    /// Every stored memory, in insertion order.
    ///
    /// # Errors
    /// Implementation-specific store failures.
    fn all(&self) -> Result<Vec<Memory>>;
}

/// Build the store selected by `config`.
#[must_use]
pub fn build_store(config: &MemoryConfig) -> Arc<dyn VectorStore> {
    match config.store {
        StoreKind::BruteForce => Arc::new(BruteForceStore::new()),
        StoreKind::Hnsw => Arc::new(HnswStore::with_params(
            config.hnsw_ef_construction,
            config.hnsw_ef_search,
        )),
    }
}

/// Borrow the embedding of `memory`, or fail with `MissingEmbedding`.
/// An empty vector is treated as missing.
pub(crate) fn require_embedding(memory: &Memory) -> Result<&Embedding> {
    memory
        .embedding
        .as_ref()
        .filter(|e| !e.0.is_empty())
        .ok_or_else(|| RecallError::MissingEmbedding {
            description: memory.description.clone(),
        })
}
