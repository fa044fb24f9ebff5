//! Knowledge-graph trait definitions and identifier type.

use std::collections::HashSet;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Opaque, stable key for a knowledge-graph entity (a Wikidata Q-id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Trait for knowledge-graph providers.
#[async_trait]
pub trait KnowledgeGraph: Send + Sync {
    /// Look up the single best-matching entity identifier for a term.
    ///
    /// Returns `Ok(None)` when the term is blank or no match exists.
    async fn resolve(&self, term: &str) -> Result<Option<EntityId>>;

    /// Expand identifiers to their one-hop neighbor identifiers, restricted
    /// to the allow-listed relation types.
    async fn expand_neighbors(&self, identifiers: &[EntityId]) -> Result<HashSet<EntityId>>;
}

/// Outgoing relation types considered when expanding neighbors.
pub const OUTGOING_PROPS: &[&str] = &[
    "P31", "P279", "P361", "P101", "P527", "P2579", "P178", "P400", "P179", "P106", "P276", "P800",
    "P166", "P272", "P495", "P127", "P138", "P159", "P176", "P463", "P30", "P36", "P17", "P47",
    "P136", "P155", "P156", "P840",
];

/// Incoming relation types considered when expanding neighbors.
pub const INCOMING_PROPS: &[&str] = &[
    "P31", "P279", "P361", "P101", "P921", "P1433", "P3095", "P710", "P131", "P171", "P607",
    "P793", "P50", "P170", "P58", "P86", "P123", "P161", "P184", "P185",
];
