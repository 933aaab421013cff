//! Property-Based Tests for multi-query retrieval.
//!
//! Uses `proptest` to check the ranking invariants under random candidate
//! sets:
//!   - at most `top_k` results
//!   - every description appears once
//!   - scores are non-increasing
//!   - each result carries the maximum score seen for its description

use std::collections::HashMap;

use proptest::prelude::*;

use recall_core::aggregation::merge_ranked;
use recall_core::embedding::cosine_similarity;
use recall_core::store::{BruteForceStore, HnswStore};
use recall_core::{Embedding, Memory, ScoredMemory, VectorStore};

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

fn arb_candidates() -> impl Strategy<Value = Vec<ScoredMemory>> {
    prop::collection::vec((0usize..8, -1.0f32..1.0), 0..40).prop_map(|pairs| {
        pairs
            .into_iter()
            .map(|(id, score)| ScoredMemory::new(Memory::new(format!("memory-{id}")), score))
            .collect()
    })
}

fn arb_vector() -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec(-1.0f32..1.0, 3)
}

// ---------------------------------------------------------------------------
// Property: merged ranking invariants
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn merged_results_respect_ranking_invariants(
        candidates in arb_candidates(),
        top_k in 1usize..10,
    ) {
        let mut best: HashMap<String, f32> = HashMap::new();
        for c in &candidates {
            let entry = best.entry(c.memory.description.clone()).or_insert(f32::MIN);
            *entry = entry.max(c.score.value());
        }

        let merged = merge_ranked(candidates, top_k);

        prop_assert!(merged.len() <= top_k);
        prop_assert_eq!(merged.len(), best.len().min(top_k));

        let mut seen = std::collections::HashSet::new();
        for scored in &merged {
            prop_assert!(seen.insert(scored.memory.description.clone()));
            prop_assert_eq!(scored.score.value(), best[&scored.memory.description]);
        }
        for pair in merged.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn truncation_keeps_the_best_scores(candidates in arb_candidates(), top_k in 1usize..10) {
        let all = merge_ranked(candidates.clone(), usize::MAX);
        let top = merge_ranked(candidates, top_k);
        for (a, b) in top.iter().zip(all.iter()) {
            prop_assert_eq!(a.score, b.score);
        }
    }
}

// ---------------------------------------------------------------------------
// Property: stores return exact cosine scores, best first
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn brute_force_scores_are_cosines(
        vectors in prop::collection::vec(arb_vector(), 1..20),
        query in arb_vector(),
        k in 1usize..8,
    ) {
        let store = BruteForceStore::new();
        for (i, v) in vectors.iter().enumerate() {
            store.add(Memory::new(format!("m{i}")).with_embedding(v.clone())).expect("add");
        }
        let q = Memory::new("q").with_embedding(query.clone());

        let hits = store.top_k(&q, k).expect("top_k");

        prop_assert_eq!(hits.len(), vectors.len().min(k));
        for hit in &hits {
            let expected = cosine_similarity(
                &Embedding(query.clone()),
                hit.memory.embedding.as_ref().expect("embedded"),
            );
            prop_assert!((hit.score.value() - expected).abs() < 1e-5);
        }
        for pair in hits.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn hnsw_results_are_sorted_and_bounded(
        vectors in prop::collection::vec(arb_vector(), 1..30),
        query in arb_vector(),
        k in 1usize..8,
    ) {
        let store = HnswStore::new();
        for (i, v) in vectors.iter().enumerate() {
            store.add(Memory::new(format!("m{i}")).with_embedding(v.clone())).expect("add");
        }
        let hits = store
            .top_k(&Memory::new("q").with_embedding(query), k)
            .expect("top_k");

        prop_assert!(hits.len() <= k);
        for pair in hits.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
        }
    }
}
