//! Benchmark fixtures for recall.

use std::sync::Arc;

use recall_core::store::VectorStore;
use recall_core::{Memory, MemoryEngine};
use recall_llm::mock::ScriptedProvider;
use recall_llm::{LlmClient, LlmHandle};

/// Embedding dimensions used by every fixture.
pub const DIMS: usize = 64;

/// A deterministic vector for memory `i`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn vector(i: usize) -> Vec<f32> {
    (0..DIMS)
        .map(|d| ((i * 31 + d * 7) as f32 / 97.0).sin())
        .collect()
}

/// Fill `store` with `count` embedded, rated memories.
///
/// # Panics
/// If the store rejects a memory, which only happens for unembedded ones.
pub fn populate(store: &dyn VectorStore, count: usize) {
    for i in 0..count {
        let memory = Memory::new(format!("Event number {i} happened in the town square"))
            .with_importance(5)
            .with_embedding(vector(i));
        store.add(memory).expect("embedded memory");
    }
}

/// An engine over `store` backed by a scripted provider.
#[must_use]
pub fn engine(store: Arc<dyn VectorStore>, top_k: usize) -> MemoryEngine {
    let provider = Arc::new(ScriptedProvider::with_dimensions(DIMS));
    let handle = Arc::new(LlmHandle::fixed(LlmClient::from_provider(provider)));
    MemoryEngine::new(top_k, store, handle)
}
