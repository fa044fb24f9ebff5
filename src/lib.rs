//! Chronomap: Temporal Knowledge Map Engine
//!
//! Computes, for a single input concept (a short label plus a free-text
//! description), two small graphs of academically related subjects that are
//! respectively more advanced (future) and more foundational (past) than
//! the input, relative to a school-year position.
//!
//! The pipeline: feature building (entity resolution, neighbor expansion,
//! embedding) -> composite similarity scoring -> field and subject
//! selection per year direction -> per-subject subtree extraction ->
//! assembly into a future map and a past map.

pub mod assembly;
pub mod cache;
pub mod config;
pub mod dataset;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod features;
pub mod kg;
pub mod selection;
pub mod similarity;
pub mod subgraph;

pub use assembly::{OutputEdge, OutputNode, TemporalMap};
pub use cache::{EngineCaches, LookupCache};
pub use config::Config;
pub use embedding::{ApiEmbeddingProvider, EmbeddingProvider};
pub use engine::{InputNode, TemporalRelationEngine, TemporalResult};
pub use error::{ChronomapError, Result};
pub use features::{ConceptFeature, FeatureBuilder};
pub use kg::{EntityId, KnowledgeGraph, WikidataClient};
pub use selection::YearDirection;
pub use subgraph::{ExtractionOptions, SubtreeResult};
