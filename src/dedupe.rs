//! Near-duplicate filtering over retrieved segments.
//!
//! A retrieved set often contains near-identical restatements, e.g. when
//! overlapping chunks both match or a page repeats itself. This pass drops
//! the later copies so the context budget is spent on distinct passages.

use crate::embedding::cosine_similarity;
use crate::index::FlatIndex;
use crate::models::RetrievalResult;

/// Pairwise similarity above which a candidate counts as a restatement of an
/// already-kept segment. High enough to keep paraphrases, dropping only
/// near-identical text. Fixed by design, not configurable.
pub const REDUNDANCY_THRESHOLD: f32 = 0.95;

/// Greedy single-pass duplicate filter, preserving input order among kept
/// items.
///
/// Iterates in input (relevance) order and keeps a candidate unless its
/// stored embedding is more than [`REDUNDANCY_THRESHOLD`]-similar to any
/// already-kept segment. First seen survives; later near-duplicates are
/// dropped. This is a clique-avoidance heuristic, not a global optimum.
///
/// Similarities are computed over the embeddings stored at build time, never
/// by re-embedding.
pub fn filter_redundant(results: Vec<RetrievalResult>, index: &FlatIndex) -> Vec<RetrievalResult> {
    let mut kept: Vec<RetrievalResult> = Vec::with_capacity(results.len());

    for candidate in results {
        let Some(candidate_vec) = index.vector(candidate.segment_id) else {
            continue;
        };

        let redundant = kept.iter().any(|k| {
            index
                .vector(k.segment_id)
                .map(|kv| cosine_similarity(candidate_vec, kv) > REDUNDANCY_THRESHOLD)
                .unwrap_or(false)
        });

        if !redundant {
            kept.push(candidate);
        }
    }

    kept
}
