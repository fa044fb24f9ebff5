//! Input concept feature construction.
//!
//! Given a concept node (label, sentence, optional extra query terms), the
//! builder produces its full feature record: representative identifier,
//! full identifier set, neighbor identifier set, and embedding vector.
//! Every provider failure degrades to the "no information" value.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use crate::cache::{EngineCaches, LookupCache};
use crate::embedding::EmbeddingProvider;
use crate::kg::{EntityId, KnowledgeGraph};
use crate::similarity::ConceptSignature;

/// The full feature record of a concept node. Built once per input and
/// immutable afterward.
#[derive(Debug, Clone)]
pub struct ConceptFeature {
    pub label: String,
    /// Always present: resolution falls back to a synthetic identifier
    /// derived from the label.
    pub representative_id: Option<EntityId>,
    pub identifiers: HashSet<EntityId>,
    pub neighbors: HashSet<EntityId>,
    pub embedding: Option<Vec<f32>>,
}

impl ConceptFeature {
    pub fn signature(&self) -> ConceptSignature<'_> {
        ConceptSignature {
            representative_id: self.representative_id.as_ref(),
            identifiers: &self.identifiers,
            neighbors: &self.neighbors,
            embedding: self.embedding.as_deref(),
        }
    }
}

/// Deterministic fallback identifier for a label that failed to resolve.
pub fn synthetic_identifier(label: &str) -> EntityId {
    EntityId::new(format!("Q_{}", label.replace(' ', "_")))
}

/// Builds [`ConceptFeature`] records from the injected providers.
pub struct FeatureBuilder {
    kg: Arc<dyn KnowledgeGraph>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    term_cache: LookupCache<Vec<String>, Arc<HashSet<EntityId>>>,
    embedding_cache: LookupCache<String, Option<Arc<Vec<f32>>>>,
}

impl FeatureBuilder {
    /// Create a builder over explicit provider objects, with caches from
    /// the composition root.
    pub fn new(
        kg: Arc<dyn KnowledgeGraph>,
        embedder: Option<Arc<dyn EmbeddingProvider>>,
        caches: &EngineCaches,
    ) -> Self {
        Self {
            kg,
            embedder,
            term_cache: caches.term_lists.clone(),
            embedding_cache: caches.embeddings.clone(),
        }
    }

    /// Build the feature record for an input concept.
    pub async fn build(&self, label: &str, sentence: &str, extend_query: &[String]) -> ConceptFeature {
        tracing::info!(label, "building input concept features");

        // Label plus extend-query terms, deduplicated with a stable order
        // so memoization keys are deterministic.
        let terms: Vec<String> = std::iter::once(label.to_string())
            .chain(extend_query.iter().cloned())
            .filter(|t| !t.trim().is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let identifiers = self.resolve_terms(terms).await;

        let representative_id = self
            .resolve_terms(vec![label.to_string()])
            .await
            .iter()
            .next()
            .cloned()
            .unwrap_or_else(|| synthetic_identifier(label));

        let mut sorted_ids: Vec<EntityId> = identifiers.iter().cloned().collect();
        sorted_ids.sort();
        let neighbors = match self.kg.expand_neighbors(&sorted_ids).await {
            Ok(neighbors) => neighbors,
            Err(e) => {
                tracing::error!(label, error = %e, "neighbor expansion failed; using empty set");
                HashSet::new()
            }
        };

        let embedding = self.embed(&format!("{} {}", label, sentence)).await;

        tracing::info!(
            label,
            identifier_count = identifiers.len(),
            neighbor_count = neighbors.len(),
            has_embedding = embedding.is_some(),
            "input concept features ready"
        );

        ConceptFeature {
            label: label.to_string(),
            representative_id: Some(representative_id),
            identifiers,
            neighbors,
            embedding,
        }
    }

    /// Resolve a term list to the union of its entity identifiers,
    /// memoized on the full list.
    async fn resolve_terms(&self, terms: Vec<String>) -> HashSet<EntityId> {
        if terms.is_empty() {
            return HashSet::new();
        }

        let resolved = self
            .term_cache
            .get_or_compute(terms.clone(), || async {
                let mut identifiers = HashSet::new();
                for term in &terms {
                    match self.kg.resolve(term).await {
                        Ok(Some(id)) => {
                            identifiers.insert(id);
                        }
                        Ok(None) => {}
                        Err(e) => {
                            tracing::debug!(term, error = %e, "term resolution failed; skipping")
                        }
                    }
                }
                Arc::new(identifiers)
            })
            .await;

        (*resolved).clone()
    }

    /// Embed text, memoized on the normalized text. Absent provider, blank
    /// text, and provider failures all yield `None`.
    async fn embed(&self, text: &str) -> Option<Vec<f32>> {
        let Some(embedder) = self.embedder.as_ref() else {
            return None;
        };

        let normalized = text.replace('\n', " ").trim().to_string();
        if normalized.is_empty() {
            return None;
        }

        self.embedding_cache
            .get_or_compute(normalized.clone(), || async {
                match embedder.embed(&normalized).await {
                    Ok(vector) if vector.len() == embedder.dimension() => Some(Arc::new(vector)),
                    Ok(vector) => {
                        tracing::error!(
                            got = vector.len(),
                            want = embedder.dimension(),
                            "embedding has wrong dimension; treating as absent"
                        );
                        None
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "embedding request failed; treating as absent");
                        None
                    }
                }
            })
            .await
            .map(|v| (*v).clone())
    }
}
