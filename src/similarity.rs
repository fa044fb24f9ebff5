//! Composite similarity scoring between concept nodes.
//!
//! Three sub-scores (identifier-path overlap, neighbor-set Jaccard,
//! embedding cosine) combined by fixed weights. The composite is the single
//! similarity primitive used everywhere in the engine: input vs field,
//! field vs subject, input vs subject, and input vs subject-map nodes.

use std::collections::HashSet;

use crate::kg::EntityId;

/// Weight of the representative-path sub-score.
pub const WEIGHT_PATH: f64 = 0.4;
/// Weight of the neighbor-set Jaccard sub-score.
pub const WEIGHT_NEIGHBOR: f64 = 0.3;
/// Weight of the embedding-cosine sub-score.
pub const WEIGHT_EMBEDDING: f64 = 0.3;

/// Borrowed view of a concept's scoring-relevant features.
///
/// Every scorable record (input feature, master row, subject-map node)
/// projects into this shape.
#[derive(Debug, Clone, Copy)]
pub struct ConceptSignature<'a> {
    /// The authoritative entity for this concept, when known.
    pub representative_id: Option<&'a EntityId>,
    /// All identifiers loosely associated with the concept.
    pub identifiers: &'a HashSet<EntityId>,
    /// Identifiers one relation-hop away.
    pub neighbors: &'a HashSet<EntityId>,
    /// Embedding vector, when available.
    pub embedding: Option<&'a [f32]>,
}

/// Jaccard similarity of two identifier sets; 0 when either is empty.
pub fn jaccard(a: &HashSet<EntityId>, b: &HashSet<EntityId>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// Cosine similarity of two vectors.
///
/// Returns 0 when either vector is absent, dimensions mismatch, any value
/// is non-finite, or either norm is zero.
pub fn cosine(a: Option<&[f32]>, b: Option<&[f32]>) -> f64 {
    let (Some(a), Some(b)) = (a, b) else {
        return 0.0;
    };
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let (x, y) = (x as f64, y as f64);
        if !x.is_finite() || !y.is_finite() {
            return 0.0;
        }
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Representative-path score between two concepts.
///
/// 1.0 when either representative identifier is a member of the other's
/// full identifier set (an "is this specific entity" match), 0.5 when the
/// full sets merely intersect, else 0.0.
pub fn path_score(a: &ConceptSignature<'_>, b: &ConceptSignature<'_>) -> f64 {
    if let Some(rep) = a.representative_id {
        if b.identifiers.contains(rep) {
            return 1.0;
        }
    }
    if let Some(rep) = b.representative_id {
        if a.identifiers.contains(rep) {
            return 1.0;
        }
    }
    if !a.identifiers.is_empty()
        && !b.identifiers.is_empty()
        && !a.identifiers.is_disjoint(b.identifiers)
    {
        return 0.5;
    }
    0.0
}

/// Fixed-weight blend of path, neighbor-Jaccard, and embedding-cosine.
pub fn composite(a: &ConceptSignature<'_>, b: &ConceptSignature<'_>) -> f64 {
    path_score(a, b) * WEIGHT_PATH
        + jaccard(a.neighbors, b.neighbors) * WEIGHT_NEIGHBOR
        + cosine(a.embedding, b.embedding) * WEIGHT_EMBEDDING
}
