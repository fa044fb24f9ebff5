//! Knowledge-graph access.
//!
//! Resolves natural-language terms to canonical entity identifiers and
//! expands identifier sets to their one-hop neighbors, restricted to an
//! allow-listed set of directed relation types. The concrete provider is
//! Wikidata; callers depend on the [`KnowledgeGraph`] trait so the provider
//! can be swapped or stubbed.

mod client;
mod types;

pub use client::WikidataClient;
pub use types::{EntityId, KnowledgeGraph, INCOMING_PROPS, OUTGOING_PROPS};

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;

use crate::cache::EngineCaches;
use crate::config::KnowledgeGraphConfig;
use crate::error::Result;

/// No-op provider used when knowledge-graph lookups are disabled.
///
/// Resolution always misses and expansion is always empty, so dependent
/// scores degrade exactly as they do on provider failure, without any
/// network traffic.
struct OfflineKnowledgeGraph;

#[async_trait]
impl KnowledgeGraph for OfflineKnowledgeGraph {
    async fn resolve(&self, _term: &str) -> Result<Option<EntityId>> {
        Ok(None)
    }

    async fn expand_neighbors(&self, _identifiers: &[EntityId]) -> Result<HashSet<EntityId>> {
        Ok(HashSet::new())
    }
}

/// Create a knowledge-graph provider from configuration.
///
/// Returns the offline no-op provider when lookups are disabled; the engine
/// then runs on synthetic identifiers alone and never contacts the remote
/// endpoints.
pub fn create_provider(
    config: &KnowledgeGraphConfig,
    caches: &EngineCaches,
) -> Result<Arc<dyn KnowledgeGraph>> {
    if !config.enabled {
        tracing::info!("knowledge-graph lookups disabled; using offline provider");
        return Ok(Arc::new(OfflineKnowledgeGraph));
    }

    Ok(Arc::new(WikidataClient::new(config.clone(), caches)?))
}
