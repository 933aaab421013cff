//! Memory Aggregation Engine.
//!
//! Turns one or more query memories into a ranked, deduplicated list of at
//! most `top_k` stored memories, and backfills importance and embeddings on
//! ingestion.
//!
//! ## Retrieval
//!
//! 1. Embed every query that lacks an embedding, concurrently. Results are
//!    paired back to their query by index. Any failure fails the call.
//! 2. Ask the store for each query's own top-`k`.
//! 3. Merge by `description`: the maximum score wins, the last-seen
//!    instance is kept.
//! 4. Stable sort by score, descending (ties keep first-seen order), and
//!    truncate to `k`.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{debug, info};

use recall_llm::client::DIGIT_UNAVAILABLE;
use recall_llm::prompt::importance_prompt;
use recall_llm::{LlmHandle, Message};

use crate::config::MemoryConfig;
use crate::embedding::embed_text;
use crate::error::{RecallError, Result};
use crate::store::{VectorStore, build_store};
use crate::types::{Memory, ScoredMemory};

/// Per-character memory engine over a [`VectorStore`].
pub struct MemoryEngine {
    default_top_k: usize,
    store: Arc<dyn VectorStore>,
    llm: Arc<LlmHandle>,
}

impl MemoryEngine {
    /// Create an engine returning `default_top_k` memories unless told otherwise.
    #[must_use]
    pub fn new(default_top_k: usize, store: Arc<dyn VectorStore>, llm: Arc<LlmHandle>) -> Self {
        Self {
            default_top_k,
            store,
            llm,
        }
    }

    /// Create an engine over the store selected by `config`, returning
    /// `default_memories_returned` memories unless told otherwise.
    #[must_use]
    pub fn from_config(config: &MemoryConfig, llm: Arc<LlmHandle>) -> Self {
        Self::new(config.default_memories_returned, build_store(config), llm)
    }

    /// The `top_k` used when a retrieval call passes none.
    #[must_use]
    pub fn default_top_k(&self) -> usize {
        self.default_top_k
    }

    /// Rate (if unrated), embed (if unembedded or empty) and index a memory.
    ///
    /// Rating asks the model for a 0–9 poignancy digit and stores digit + 1,
    /// so a rated memory always has importance in 1..=10.
    ///
    /// Returns the memory as stored.
    ///
    /// # Errors
    /// - [`RecallError::RatingUnavailable`] if the rating protocol exhausts
    ///   its attempts. Nothing is stored.
    /// - [`RecallError::Llm`] if the client cannot be built or embedding fails.
    /// - Any store error.
    pub async fn add_memory(&self, mut memory: Memory) -> Result<Memory> {
        if memory.is_unrated() || memory.needs_embedding() {
            let llm = self.llm.get()?;

            if memory.is_unrated() {
                let prompt = [Message::user(importance_prompt(&memory.description))];
                let digit = llm.digit_completion(&prompt).await;
                if digit == DIGIT_UNAVAILABLE {
                    return Err(RecallError::RatingUnavailable {
                        description: memory.description,
                    });
                }
                memory.importance = u8::try_from(digit + 1).map_err(|_| {
                    RecallError::RatingUnavailable {
                        description: memory.description.clone(),
                    }
                })?;
                debug!(
                    memory = %memory.description,
                    importance = memory.importance,
                    "Rated memory importance"
                );
            }

            if memory.needs_embedding() {
                memory.embedding = Some(embed_text(&llm, &memory.description).await?);
            }
        }

        self.store.add(memory.clone())?;
        Ok(memory)
    }

    /// Every memory in the store.
    ///
    /// # Errors
    /// Propagates store failures.
    pub fn all_memories(&self) -> Result<Vec<Memory>> {
        self.store.all()
    }

    /// The ranked, deduplicated memories most relevant to `queries`.
    ///
    /// `top_k` of `None` (or `Some(0)`) uses the engine default.
    ///
    /// # Errors
    /// Fails the whole call if any query's embedding cannot be computed, or
    /// on store failure.
    pub async fn retrieve_relevant_memories(
        &self,
        queries: Vec<Memory>,
        top_k: Option<usize>,
    ) -> Result<Vec<Memory>> {
        Ok(self
            .retrieve_ranked(queries, top_k)
            .await?
            .into_iter()
            .map(|scored| scored.memory)
            .collect())
    }

    /// Like [`retrieve_relevant_memories`](Self::retrieve_relevant_memories),
    /// keeping the merged score of each memory.
    ///
    /// # Errors
    /// See [`retrieve_relevant_memories`](Self::retrieve_relevant_memories).
    pub async fn retrieve_ranked(
        &self,
        queries: Vec<Memory>,
        top_k: Option<usize>,
    ) -> Result<Vec<ScoredMemory>> {
        if queries.is_empty() {
            return Ok(Vec::new());
        }
        let k = top_k.filter(|&k| k > 0).unwrap_or(self.default_top_k);

        let queries = self.embed_queries(queries).await?;

        let mut candidates = Vec::new();
        for query in &queries {
            candidates.extend(self.store.top_k(query, k)?);
        }

        let ranked = merge_ranked(candidates, k);
        for scored in &ranked {
            debug!(
                memory = %scored.memory.description,
                score = scored.score.value(),
                "Pulled memory"
            );
        }
        info!(queries = queries.len(), returned = ranked.len(), "Retrieved relevant memories");
        Ok(ranked)
    }

    async fn embed_queries(&self, queries: Vec<Memory>) -> Result<Vec<Memory>> {
        if !queries.iter().any(Memory::needs_embedding) {
            return Ok(queries);
        }
        let llm = self.llm.get()?;
        let llm = llm.as_ref();

        try_join_all(queries.into_iter().map(|mut query| async move {
            if query.needs_embedding() {
                query.embedding = Some(embed_text(llm, &query.description).await?);
            }
            Ok::<_, RecallError>(query)
        }))
        .await
    }
}

/// Merge per-query candidates by description and rank them.
///
/// Keeps the maximum score for each description and the last-seen memory
/// instance. The sort is stable, so equal scores keep first-seen order.
#[must_use]
pub fn merge_ranked(candidates: Vec<ScoredMemory>, top_k: usize) -> Vec<ScoredMemory> {
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut merged: Vec<ScoredMemory> = Vec::new();

    for candidate in candidates {
        match slots.get(&candidate.memory.description) {
            Some(&slot) => {
                let existing = &mut merged[slot];
                existing.score = existing.score.max(candidate.score);
                existing.memory = candidate.memory;
            }
            None => {
                slots.insert(candidate.memory.description.clone(), merged.len());
                merged.push(candidate);
            }
        }
    }

    merged.sort_by(|a, b| b.score.cmp(&a.score));
    merged.truncate(top_k);
    merged
}
