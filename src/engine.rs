//! The temporal relation engine.
//!
//! Composition root and entry point: resolves the input concept's features,
//! finds the most similar academic field, selects subjects in both year
//! directions, and assembles the future and past maps. Top-level failures
//! become the `error` field of a well-formed result; [`compute`] never
//! returns `Err` past the boundary.
//!
//! [`compute`]: TemporalRelationEngine::compute

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::assembly::{self, TemporalMap};
use crate::cache::EngineCaches;
use crate::config::Config;
use crate::dataset;
use crate::embedding::{self, EmbeddingProvider};
use crate::error::{ChronomapError, Result};
use crate::features::{ConceptFeature, FeatureBuilder};
use crate::kg::{self, KnowledgeGraph};
use crate::selection::{self, YearDirection};
use crate::subgraph::ExtractionOptions;

/// The caller-supplied input concept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputNode {
    pub label: String,
    #[serde(default)]
    pub sentence: String,
    #[serde(default)]
    pub extend_query: Vec<String>,
    #[serde(default = "default_year")]
    pub year: i32,
    /// Caller-side id of the base concept, excluded from the output maps.
    /// Older callers send it under the `apiNodeId` key.
    #[serde(default, alias = "apiNodeId")]
    pub id: Option<String>,
}

fn default_year() -> i32 {
    3
}

/// The engine's result: one map per year direction, plus an error message
/// when the request failed as a whole.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemporalResult {
    pub future_map: TemporalMap,
    pub past_map: TemporalMap,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TemporalResult {
    fn failed(message: impl Into<String>) -> Self {
        Self {
            future_map: TemporalMap::empty(),
            past_map: TemporalMap::empty(),
            error: Some(message.into()),
        }
    }
}

/// Computes temporal knowledge maps for input concepts.
///
/// Constructed once at process start and reused across calls; the injected
/// caches are the only state shared between calls.
pub struct TemporalRelationEngine {
    config: Config,
    features: FeatureBuilder,
}

impl TemporalRelationEngine {
    /// Create an engine over explicit provider objects.
    pub fn new(
        config: Config,
        kg: Arc<dyn KnowledgeGraph>,
        embedder: Option<Arc<dyn EmbeddingProvider>>,
        caches: EngineCaches,
    ) -> Self {
        let features = FeatureBuilder::new(kg, embedder, &caches);
        Self { config, features }
    }

    /// Build the engine with its default providers (Wikidata entity
    /// resolution and expansion, OpenAI-compatible embeddings).
    pub fn from_config(config: Config) -> Result<Self> {
        let caches = EngineCaches::new(&config.cache);
        let kg = kg::create_provider(&config.knowledge_graph, &caches)?;
        let embedder = embedding::create_provider(&config.embedding)?;
        Ok(Self::new(config, kg, embedder, caches))
    }

    /// Compute the temporal relation maps for one input concept.
    pub async fn compute(&self, input: InputNode) -> TemporalResult {
        if input.label.trim().is_empty() {
            tracing::error!("input node has no usable label; aborting before any lookup");
            return TemporalResult::failed(
                "The input node does not contain a usable label.",
            );
        }

        tracing::info!(label = %input.label, year = input.year, "computing temporal relation");

        match self.run(&input).await {
            Ok((future_map, past_map)) => TemporalResult {
                future_map,
                past_map,
                error: None,
            },
            Err(e) => {
                tracing::error!(label = %input.label, error = %e, "temporal relation failed");
                TemporalResult::failed(e.to_string())
            }
        }
    }

    async fn run(&self, input: &InputNode) -> Result<(TemporalMap, TemporalMap)> {
        let fields = dataset::load_master_records(&self.config.fields_path())?;
        let subjects = dataset::load_master_records(&self.config.subjects_path())?;

        let feature = self
            .features
            .build(&input.label, &input.sentence, &input.extend_query)
            .await;

        let field = selection::select_field(&feature, &fields).ok_or(ChronomapError::NoFieldMatch)?;

        let mut future_map = self.assemble_direction(
            &feature,
            field,
            &subjects,
            input.year,
            YearDirection::Future,
        );
        let mut past_map = self.assemble_direction(
            &feature,
            field,
            &subjects,
            input.year,
            YearDirection::Past,
        );

        // The base concept must not reappear as if it were a discovered
        // relation.
        if let Some(base_id) = input.id.as_deref() {
            tracing::info!(base_id, "removing base node from both maps");
            future_map.remove_node(base_id);
            past_map.remove_node(base_id);
        }

        Ok((future_map, past_map))
    }

    fn assemble_direction(
        &self,
        feature: &ConceptFeature,
        field: &dataset::MasterRecord,
        subjects: &[dataset::MasterRecord],
        year: i32,
        direction: YearDirection,
    ) -> TemporalMap {
        let selected = selection::select_subjects(
            feature,
            field,
            subjects,
            year,
            direction,
            self.config.selection.top_k_subjects,
        );

        let options = ExtractionOptions {
            top_n_nodes: self.config.selection.top_n_nodes_in_subgraph,
            similarity_threshold: self.config.selection.similarity_threshold,
        };

        assembly::assemble_map(feature, &selected, &self.config.subject_maps_dir(), options)
    }
}
