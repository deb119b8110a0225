//! Exact top-k retrieval over the stored vectors.
//!
//! Every stored vector is scored against the query by cosine similarity in
//! a single linear scan. The index is small enough that exactness beats
//! any approximate structure, and the scan has no state to keep in sync
//! with the store.

use crate::error::{Error, Result};
use crate::llm::Embedder;
use crate::store::{Chunk, IndexStore};

/// Default number of chunks retrieved per query.
pub const DEFAULT_TOP_K: usize = 5;

/// Return the `k` stored chunks most similar to the query, best first.
///
/// Fails with [`Error::EmptyIndex`] when nothing has been indexed yet.
pub fn retrieve(
    embedder: &dyn Embedder,
    store: &IndexStore,
    query: &str,
    k: usize,
) -> Result<Vec<Chunk>> {
    let entries = store.entries()?;
    if entries.is_empty() {
        return Err(Error::EmptyIndex);
    }

    let query_vector = embedder.embed(query)?;
    let dimension = entries[0].1.len();
    if query_vector.len() != dimension {
        return Err(Error::Config(format!(
            "query embedding dimension {} does not match index dimension \
             {dimension}; was the index built with a different model?",
            query_vector.len(),
        )));
    }

    let mut scored: Vec<(f32, Chunk)> = entries
        .into_iter()
        .map(|(chunk, vector)| {
            (cosine_similarity(&query_vector, &vector), chunk)
        })
        .collect();

    // Sort by similarity descending.
    scored.sort_by(|a, b| {
        b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal)
    });
    scored.truncate(k);

    tracing::debug!(
        "retrieved {} chunks, best score {:.4}",
        scored.len(),
        scored.first().map(|(score, _)| *score).unwrap_or(0.0)
    );

    Ok(scored.into_iter().map(|(_, chunk)| chunk).collect())
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot_product / (norm_a * norm_b)
    }
}
