//! HNSW vector store: approximate nearest-neighbour search.
//!
//! Wraps `instant-distance`. The graph is immutable once built, so inserts
//! land in an unindexed tail that is scanned exactly on every query; the
//! graph is rebuilt lazily, on the next query, once the tail grows past a
//! fraction of the total. Requests for more than `ef_search` results, or
//! for the whole store, skip the graph and scan every point.

use instant_distance::{Builder, HnswMap, Point, Search};
use parking_lot::Mutex;
use tracing::debug;

use super::{VectorStore, require_embedding};
use crate::error::Result;
use crate::types::{Embedding, Memory, ScoredMemory};

/// Rebuild once more than this fraction of points is unindexed.
const AUTO_REBUILD_THRESHOLD: f32 = 0.2;

// ---------------------------------------------------------------------------
// HnswPoint: adapter from Embedding to instant-distance Point trait
// ---------------------------------------------------------------------------

/// A unit-length copy of an embedding.
#[derive(Clone, Debug)]
struct HnswPoint {
    normalized: Vec<f32>,
}

impl HnswPoint {
    fn from_embedding(embedding: &Embedding) -> Self {
        let norm = embedding
            .0
            .iter()
            .map(|x| x * x)
            .sum::<f32>()
            .sqrt()
            .max(f32::EPSILON);
        Self {
            normalized: embedding.0.iter().map(|x| x / norm).collect(),
        }
    }

    fn similarity(&self, other: &Self) -> f32 {
        1.0 - self.distance(other)
    }
}

impl Point for HnswPoint {
    /// Cosine distance. Points are pre-normalized, so similarity is the dot product.
    fn distance(&self, other: &Self) -> f32 {
        if self.normalized.len() != other.normalized.len() {
            return 1.0;
        }
        let dot: f32 = self
            .normalized
            .iter()
            .zip(other.normalized.iter())
            .map(|(a, b)| a * b)
            .sum();
        (1.0 - dot).max(0.0)
    }
}

// ---------------------------------------------------------------------------
// HnswStore
// ---------------------------------------------------------------------------

struct Inner {
    memories: Vec<Memory>,
    points: Vec<HnswPoint>,
    /// Graph over `points[..indexed]`, valued by slot index.
    map: Option<HnswMap<HnswPoint, usize>>,
    indexed: usize,
}

impl Inner {
    fn dirty(&self) -> usize {
        self.points.len() - self.indexed
    }

    #[allow(clippy::cast_precision_loss)]
    fn needs_rebuild(&self) -> bool {
        let total = self.points.len();
        if total == 0 {
            return false;
        }
        if self.map.is_none() {
            return true;
        }
        (self.dirty() as f32 / total as f32) > AUTO_REBUILD_THRESHOLD
    }
}

/// A vector store backed by an HNSW graph.
pub struct HnswStore {
    inner: Mutex<Inner>,
    ef_construction: usize,
    ef_search: usize,
}

impl HnswStore {
    /// Create an empty store with default parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::with_params(100, 50)
    }

    /// Create with custom HNSW parameters.
    #[must_use]
    pub fn with_params(ef_construction: usize, ef_search: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                memories: Vec::new(),
                points: Vec::new(),
                map: None,
                indexed: 0,
            }),
            ef_construction,
            ef_search,
        }
    }

    /// Number of stored memories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().memories.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().memories.is_empty()
    }

    /// Whether the next query will rebuild the graph.
    #[must_use]
    pub fn needs_rebuild(&self) -> bool {
        self.inner.lock().needs_rebuild()
    }

    /// Build the graph over every stored point now.
    pub fn rebuild(&self) {
        let mut inner = self.inner.lock();
        self.rebuild_locked(&mut inner);
    }

    fn rebuild_locked(&self, inner: &mut Inner) {
        if inner.points.is_empty() {
            return;
        }
        let values: Vec<usize> = (0..inner.points.len()).collect();
        let map = Builder::default()
            .ef_construction(self.ef_construction)
            .ef_search(self.ef_search)
            .seed(42)
            .build(inner.points.clone(), values);
        inner.map = Some(map);
        inner.indexed = inner.points.len();
        debug!(points = inner.indexed, "HNSW graph rebuilt");
    }
}

impl Default for HnswStore {
    fn default() -> Self {
        Self::new()
    }
}

impl VectorStore for HnswStore {
    fn add(&self, memory: Memory) -> Result<()> {
        let point = HnswPoint::from_embedding(require_embedding(&memory)?);
        let mut inner = self.inner.lock();
        inner.points.push(point);
        inner.memories.push(memory);
        Ok(())
    }

    fn top_k(&self, query: &Memory, k: usize) -> Result<Vec<ScoredMemory>> {
        let query = HnswPoint::from_embedding(require_embedding(query)?);
        let mut inner = self.inner.lock();

        // The graph yields at most `ef_search` neighbours, so larger requests
        // (or ones covering the whole store) are answered by an exact scan.
        let exhaustive = k > self.ef_search || k >= inner.points.len();
        if !exhaustive && inner.needs_rebuild() {
            self.rebuild_locked(&mut inner);
        }

        let scan_from = if exhaustive { 0 } else { inner.indexed };
        let mut hits: Vec<(f32, usize)> = Vec::new();
        if let Some(map) = inner.map.as_ref().filter(|_| !exhaustive) {
            let mut search = Search::default();
            hits.extend(
                map.search(&query, &mut search)
                    .take(k)
                    .map(|item| (1.0 - item.distance, *item.value)),
            );
        }
        hits.extend(
            inner.points[scan_from..]
                .iter()
                .enumerate()
                .map(|(offset, point)| (query.similarity(point), scan_from + offset)),
        );

        hits.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
        hits.truncate(k);

        Ok(hits
            .into_iter()
            .map(|(similarity, slot)| ScoredMemory::new(inner.memories[slot].clone(), similarity))
            .collect())
    }

    fn all(&self) -> Result<Vec<Memory>> {
        Ok(self.inner.lock().memories.clone())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn embedded(description: &str, values: &[f32]) -> Memory {
        Memory::new(description).with_embedding(values.to_vec())
    }

    #[test]
    fn empty_store_returns_no_results() {
        let store = HnswStore::new();
        let hits = store.top_k(&embedded("q", &[1.0, 0.0, 0.0]), 5).expect("top_k");
        assert!(hits.is_empty());
    }

    #[test]
    fn first_query_builds_graph() {
        let store = HnswStore::new();
        store.add(embedded("east", &[1.0, 0.0])).expect("add");
        store.add(embedded("west", &[-1.0, 0.0])).expect("add");
        assert!(store.needs_rebuild());

        let hits = store.top_k(&embedded("q", &[1.0, 0.0]), 1).expect("top_k");
        assert_eq!(hits[0].memory.description, "east");
        assert!(!store.needs_rebuild());
    }

    #[test]
    #[allow(clippy::cast_precision_loss)]
    fn build_and_search_on_a_circle() {
        let store = HnswStore::new();
        for i in 0..50 {
            let angle = (i as f32 / 50.0) * std::f32::consts::TAU;
            store
                .add(embedded(&format!("m{i}"), &[angle.cos(), angle.sin(), 0.0]))
                .expect("add");
        }
        store.rebuild();

        let hits = store.top_k(&embedded("q", &[1.0, 0.0, 0.0]), 5).expect("top_k");
        assert_eq!(hits.len(), 5);
        assert!(hits[0].score.value() > 0.95, "top result sim={}", hits[0].score.value());
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn unindexed_tail_is_searched() {
        let store = HnswStore::new();
        for i in 0..10 {
            store.add(embedded(&format!("west{i}"), &[-1.0, 0.0])).expect("add");
        }
        store.rebuild();

        // 1 of 11 points is dirty: below the threshold, so no rebuild.
        store.add(embedded("east", &[1.0, 0.0])).expect("add");
        assert!(!store.needs_rebuild());

        let hits = store.top_k(&embedded("q", &[1.0, 0.0]), 1).expect("top_k");
        assert_eq!(hits[0].memory.description, "east");
    }

    #[test]
    fn needs_rebuild_after_many_inserts() {
        let store = HnswStore::new();
        store.add(embedded("a", &[1.0, 0.0])).expect("add");
        store.rebuild();
        assert!(!store.needs_rebuild());

        store.add(embedded("b", &[0.0, 1.0])).expect("add");
        assert!(store.needs_rebuild());
        assert_eq!(store.len(), 2);
    }

    #[test]
    #[allow(clippy::cast_precision_loss)]
    fn requests_beyond_ef_search_return_k_results() {
        let store = HnswStore::with_params(100, 50);
        let brute = crate::store::BruteForceStore::new();
        for i in 0..120 {
            let angle = (i as f32 / 120.0) * std::f32::consts::TAU;
            let memory = embedded(&format!("m{i}"), &[angle.cos(), angle.sin()]);
            store.add(memory.clone()).expect("add");
            brute.add(memory).expect("add");
        }
        store.rebuild();

        let query = embedded("q", &[1.0, 0.0]);
        let hits = store.top_k(&query, 80).expect("top_k");
        let exact = brute.top_k(&query, 80).expect("top_k");

        assert_eq!(hits.len(), 80);
        assert_eq!(hits[0].memory.description, "m0");
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
        let worst = exact[79].score.value();
        assert!(hits.iter().all(|h| h.score.value() >= worst - 1e-5));
    }

    #[test]
    fn whole_store_request_skips_the_graph() {
        let store = HnswStore::new();
        store.add(embedded("a", &[1.0, 0.0])).expect("add");
        store.add(embedded("b", &[0.0, 1.0])).expect("add");

        let hits = store.top_k(&embedded("q", &[0.0, 1.0]), 5).expect("top_k");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].memory.description, "b");
        assert!(store.needs_rebuild());
    }
}
