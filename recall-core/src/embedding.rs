//! Embedding helpers: similarity metrics and provider-backed embedding.

use recall_llm::LlmClient;

use crate::error::Result;
use crate::types::Embedding;

// ---------------------------------------------------------------------------
// Similarity
// ---------------------------------------------------------------------------

/// Compute the cosine similarity between two embedding vectors.
///
/// Uses the product of both norms. Returns a value in \[-1.0, 1.0\], or
/// `0.0` if either vector has zero magnitude or the dimensions differ.
#[must_use]
pub fn cosine_similarity(a: &Embedding, b: &Embedding) -> f32 {
    a.cosine_similarity(b)
}

/// Euclidean (L2) distance between two embedding vectors.
///
/// Returns `None` if the dimensions differ.
#[must_use]
pub fn euclidean_distance(a: &Embedding, b: &Embedding) -> Option<f32> {
    if a.0.len() != b.0.len() {
        return None;
    }
    Some(
        a.0.iter()
            .zip(b.0.iter())
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f32>()
            .sqrt(),
    )
}

// ---------------------------------------------------------------------------
// Provider-backed embedding
// ---------------------------------------------------------------------------

/// Embed `text` through the LLM client.
///
/// # Errors
/// Propagates the provider failure as [`crate::RecallError::Llm`].
pub async fn embed_text(llm: &LlmClient, text: &str) -> Result<Embedding> {
    Ok(Embedding(llm.embed(text).await?))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
