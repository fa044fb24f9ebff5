//! Wikidata-backed knowledge-graph client.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::cache::{EngineCaches, LookupCache};
use crate::config::KnowledgeGraphConfig;
use crate::error::{KnowledgeGraphError, Result};

use super::{EntityId, KnowledgeGraph, INCOMING_PROPS, OUTGOING_PROPS};

const ENTITY_URI_PREFIX: &str = "http://www.wikidata.org/entity/Q";

/// Knowledge-graph client over the Wikidata search API and SPARQL endpoint.
///
/// Resolution and expansion results are memoized in bounded caches injected
/// at construction. Provider failures are logged and degrade to "no match" /
/// empty rather than propagating.
pub struct WikidataClient {
    client: Client,
    config: KnowledgeGraphConfig,
    resolution_cache: LookupCache<String, Option<EntityId>>,
    neighbor_cache: LookupCache<Vec<EntityId>, Arc<HashSet<EntityId>>>,
}

/// wbsearchentities response shape.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    id: String,
}

/// SPARQL select response shape.
#[derive(Debug, Deserialize)]
struct SparqlResponse {
    #[serde(default)]
    results: SparqlResults,
}

#[derive(Debug, Default, Deserialize)]
struct SparqlResults {
    #[serde(default)]
    bindings: Vec<SparqlBinding>,
}

#[derive(Debug, Deserialize)]
struct SparqlBinding {
    related: Option<SparqlValue>,
}

#[derive(Debug, Deserialize)]
struct SparqlValue {
    value: String,
}

impl WikidataClient {
    /// Create a new client from configuration, with caches injected from the
    /// composition root.
    pub fn new(config: KnowledgeGraphConfig, caches: &EngineCaches) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| {
                KnowledgeGraphError::Request(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            config,
            resolution_cache: caches.resolution.clone(),
            neighbor_cache: caches.neighbors.clone(),
        })
    }

    /// One entity-search request. Unlike [`KnowledgeGraph::resolve`], errors
    /// surface so the caller decides how to degrade.
    async fn search_entity(&self, term: &str) -> Result<Option<EntityId>> {
        let params = [
            ("action", "wbsearchentities"),
            ("format", "json"),
            ("language", self.config.language.as_str()),
            ("uselang", self.config.language.as_str()),
            ("search", term),
            ("limit", "1"),
        ];

        let response = self
            .client
            .get(&self.config.api_endpoint)
            .query(&params)
            .send()
            .await
            .map_err(|e| KnowledgeGraphError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(KnowledgeGraphError::Response {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| KnowledgeGraphError::Request(format!("Failed to parse response: {}", e)))?;

        Ok(parsed.search.into_iter().next().map(|hit| EntityId::new(hit.id)))
    }

    /// One SPARQL neighbor query for a single identifier.
    async fn neighbor_query(&self, id: &EntityId) -> Result<HashSet<EntityId>> {
        let query = build_neighbor_query(id, self.config.neighbor_limit);

        let response = self
            .client
            .get(&self.config.sparql_endpoint)
            .header("Accept", "application/sparql-results+json")
            .query(&[("query", query.as_str()), ("format", "json")])
            .send()
            .await
            .map_err(|e| KnowledgeGraphError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(KnowledgeGraphError::Response {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let parsed: SparqlResponse = response
            .json()
            .await
            .map_err(|e| KnowledgeGraphError::Request(format!("Failed to parse response: {}", e)))?;

        let mut neighbors = HashSet::new();
        for binding in parsed.results.bindings {
            let Some(value) = binding.related else {
                continue;
            };
            // Only well-formed entity URIs count; the query already excludes
            // the source identifier itself.
            if let Some(qid) = value.value.strip_prefix(ENTITY_URI_PREFIX) {
                neighbors.insert(EntityId::new(format!("Q{}", qid)));
            }
        }

        Ok(neighbors)
    }

    async fn throttle(&self, delay_ms: u64) {
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }
    }
}

#[async_trait]
impl KnowledgeGraph for WikidataClient {
    async fn resolve(&self, term: &str) -> Result<Option<EntityId>> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(None);
        }

        let resolved = self
            .resolution_cache
            .get_or_compute(term.to_string(), || async {
                let result = match self.search_entity(term).await {
                    Ok(hit) => hit,
                    Err(e) => {
                        tracing::debug!(term, error = %e, "entity search failed; treating as no match");
                        None
                    }
                };
                self.throttle(self.config.request_delay_ms).await;
                result
            })
            .await;

        Ok(resolved)
    }

    async fn expand_neighbors(&self, identifiers: &[EntityId]) -> Result<HashSet<EntityId>> {
        if identifiers.is_empty() {
            return Ok(HashSet::new());
        }

        // Identifiers beyond the expansion cap are ignored, not sampled.
        let capped: Vec<EntityId> = identifiers
            .iter()
            .take(self.config.max_ids_to_expand)
            .cloned()
            .collect();

        let neighbors = self
            .neighbor_cache
            .get_or_compute(capped.clone(), || async {
                let mut aggregated = HashSet::new();
                for id in &capped {
                    match self.neighbor_query(id).await {
                        Ok(found) => aggregated.extend(found),
                        Err(e) => {
                            tracing::error!(id = %id, error = %e, "neighbor query failed; skipping")
                        }
                    }
                    self.throttle(self.config.request_delay_ms / 2).await;
                }
                Arc::new(aggregated)
            })
            .await;

        Ok((*neighbors).clone())
    }
}

/// Build the one-hop neighbor SPARQL query for a single identifier.
fn build_neighbor_query(id: &EntityId, limit: usize) -> String {
    let outgoing = OUTGOING_PROPS
        .iter()
        .map(|p| format!("wdt:{}", p))
        .collect::<Vec<_>>()
        .join(" ");
    let incoming = INCOMING_PROPS
        .iter()
        .map(|p| format!("wdt:{}", p))
        .collect::<Vec<_>>()
        .join(" ");

    format!(
        "SELECT DISTINCT ?related WHERE {{ \
         {{ wd:{id} ?prop_out ?related . VALUES ?prop_out {{ {outgoing} }} }} \
         UNION \
         {{ ?related ?prop_in wd:{id} . VALUES ?prop_in {{ {incoming} }} }} \
         FILTER(STRSTARTS(STR(?related), '{prefix}')) \
         FILTER(?related != wd:{id}) \
         }} LIMIT {limit}",
        id = id,
        outgoing = outgoing,
        incoming = incoming,
        prefix = ENTITY_URI_PREFIX,
        limit = limit,
    )
}
