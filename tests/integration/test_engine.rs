//! End-to-end temporal relation scenarios.

use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;

use chronomap::engine::{InputNode, TemporalRelationEngine};
use chronomap::{Config, EngineCaches, EntityId, KnowledgeGraph};

/// Stub knowledge graph with a fixed term table and neighbor set.
struct StubKg {
    entities: HashMap<String, EntityId>,
    neighbors: HashSet<EntityId>,
}

impl StubKg {
    fn new(entities: &[(&str, &str)], neighbors: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            entities: entities
                .iter()
                .map(|(term, id)| (term.to_string(), EntityId::from(*id)))
                .collect(),
            neighbors: neighbors.iter().map(|id| EntityId::from(*id)).collect(),
        })
    }
}

#[async_trait]
impl KnowledgeGraph for StubKg {
    async fn resolve(&self, term: &str) -> chronomap::Result<Option<EntityId>> {
        Ok(self.entities.get(term.trim()).cloned())
    }

    async fn expand_neighbors(
        &self,
        identifiers: &[EntityId],
    ) -> chronomap::Result<HashSet<EntityId>> {
        if identifiers.is_empty() {
            return Ok(HashSet::new());
        }
        Ok(self.neighbors.clone())
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn write_file(dir: &TempDir, name: &str, content: &str) {
    let mut file = std::fs::File::create(dir.path().join(name)).unwrap();
    file.write_all(content.as_bytes()).unwrap();
}

/// Fixture: one matching field, one future subject (year 3) with a
/// root-anchored map, one past subject (year 1) whose best match is an
/// interior node, and one distractor subject.
fn write_reference_data(dir: &TempDir) {
    write_file(
        dir,
        "fields.csv",
        "label,all_node_qids,neighboring_qids\n\
         Mathematics,Q395,Q11518\n\
         Biology,\"Q420,Q11982\",Q7868\n",
    );
    write_file(
        dir,
        "subjects.csv",
        "label,year,all_node_qids,neighboring_qids\n\
         Algebra,3,Q395,Q11518\n\
         Advanced Biology,3,\"Q420,Q11982\",Q7868\n\
         Basic Science,1,\"Q336,Q11982\",Q7868\n",
    );

    write_file(
        dir,
        "subject_map_Advanced Biology_nodes.csv",
        "id,label,sentence,representative_qid,all_node_qids\n\
         advbio_0,Cell biology,Structure of living cells,Q11982,Q11982\n\
         advbio_1,Mitochondria,Energy production,Q39572,Q39572\n",
    );
    write_file(
        dir,
        "subject_map_Advanced Biology_edges.csv",
        "source,target\nadvbio_0,advbio_1\n",
    );

    write_file(
        dir,
        "subject_map_Basic Science_nodes.csv",
        "id,label,sentence,representative_qid,all_node_qids\n\
         bs_0,Science,All of science,Q336,Q336\n\
         bs_1,Nature,The natural world,Q7860,Q7860\n\
         bs_2,Plants,How plants grow,Q11982,Q11982\n",
    );
    write_file(
        dir,
        "subject_map_Basic Science_edges.csv",
        "source,target\nbs_0,bs_1\nbs_1,bs_2\n",
    );
}

fn test_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.datasets.fields_path = dir.path().join("fields.csv").display().to_string();
    config.datasets.subjects_path = dir.path().join("subjects.csv").display().to_string();
    config.datasets.subject_maps_dir = dir.path().display().to_string();
    config
}

fn test_engine(dir: &TempDir) -> TemporalRelationEngine {
    let kg = StubKg::new(
        &[("Photosynthesis", "Q11982"), ("Chlorophyll", "Q43177")],
        &["Q7868"],
    );
    TemporalRelationEngine::new(test_config(dir), kg, None, EngineCaches::default())
}

fn photosynthesis_input(year: i32) -> InputNode {
    InputNode {
        label: "Photosynthesis".to_string(),
        sentence: "Plants convert light into chemical energy".to_string(),
        extend_query: vec!["Chlorophyll".to_string()],
        year,
        id: None,
    }
}

#[tokio::test]
async fn test_future_and_past_maps_from_matching_subjects() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    write_reference_data(&dir);
    let engine = test_engine(&dir);

    let result = engine.compute(photosynthesis_input(2)).await;
    assert!(result.error.is_none(), "unexpected error: {:?}", result.error);

    // Future: the synthetic input node plus the year-3 subject's subtree.
    let future_ids: Vec<&str> = result.future_map.nodes.iter().map(|n| n.id.as_str()).collect();
    assert!(future_ids.contains(&"input_Photosynthesis"));
    assert!(future_ids.contains(&"advbio_0"));
    assert!(future_ids.contains(&"advbio_1"));
    assert!(!future_ids.iter().any(|id| id.starts_with("bs_")));

    let input_node = result
        .future_map
        .nodes
        .iter()
        .find(|n| n.id == "input_Photosynthesis")
        .unwrap();
    assert_eq!(input_node.group, "Input");
    assert_eq!(
        input_node.extend_query,
        Some(vec!["Q11982".to_string(), "Q43177".to_string()])
    );

    let subtree_node = result
        .future_map
        .nodes
        .iter()
        .find(|n| n.id == "advbio_0")
        .unwrap();
    assert_eq!(subtree_node.group, "Advanced Biology");
    assert_eq!(
        subtree_node.sentence.as_deref(),
        Some("Structure of living cells")
    );

    // Connector from the input to the entry point, then the tree edge.
    assert!(result
        .future_map
        .edges
        .iter()
        .any(|e| e.source == "input_Photosynthesis" && e.target == "advbio_0"));
    assert!(result
        .future_map
        .edges
        .iter()
        .any(|e| e.source == "advbio_0" && e.target == "advbio_1"));

    // Past: the year-1 subject's best match is interior (bs_2), so the map
    // carries the full root-to-entry ancestry.
    let past_ids: Vec<&str> = result.past_map.nodes.iter().map(|n| n.id.as_str()).collect();
    assert!(past_ids.contains(&"input_Photosynthesis"));
    assert!(past_ids.contains(&"bs_2"));
    assert!(past_ids.contains(&"bs_1"));
    assert!(past_ids.contains(&"bs_0"));
    assert!(!past_ids.iter().any(|id| id.starts_with("advbio_")));

    assert!(result
        .past_map
        .edges
        .iter()
        .any(|e| e.source == "input_Photosynthesis" && e.target == "bs_2"));
    assert!(result
        .past_map
        .edges
        .iter()
        .any(|e| e.source == "bs_0" && e.target == "bs_1"));
}

#[tokio::test]
async fn test_empty_direction_yields_input_only_map() {
    let dir = TempDir::new().unwrap();
    write_reference_data(&dir);
    let engine = test_engine(&dir);

    // Year 1: no subject has a strictly smaller year.
    let result = engine.compute(photosynthesis_input(1)).await;
    assert!(result.error.is_none());

    assert_eq!(result.past_map.nodes.len(), 1);
    assert_eq!(result.past_map.nodes[0].id, "input_Photosynthesis");
    assert!(result.past_map.edges.is_empty());

    // The future direction still finds the year-3 subject.
    assert!(result.future_map.nodes.len() > 1);
}

#[tokio::test]
async fn test_blank_label_returns_error_with_empty_maps() {
    let dir = TempDir::new().unwrap();
    write_reference_data(&dir);
    let engine = test_engine(&dir);

    let result = engine
        .compute(InputNode {
            label: String::new(),
            sentence: String::new(),
            extend_query: vec![],
            year: 3,
            id: None,
        })
        .await;

    assert!(result.error.as_deref().is_some_and(|e| !e.is_empty()));
    assert!(result.future_map.nodes.is_empty());
    assert!(result.future_map.edges.is_empty());
    assert!(result.past_map.nodes.is_empty());
    assert!(result.past_map.edges.is_empty());
}

#[tokio::test]
async fn test_missing_reference_dataset_is_a_top_level_error() {
    let dir = TempDir::new().unwrap();
    // Deliberately no fixture files.
    let engine = test_engine(&dir);

    let result = engine.compute(photosynthesis_input(2)).await;
    assert!(result.error.is_some());
    assert!(result.future_map.nodes.is_empty());
    assert!(result.past_map.nodes.is_empty());
}

#[tokio::test]
async fn test_base_node_id_is_excluded_from_results() {
    let dir = TempDir::new().unwrap();
    write_reference_data(&dir);
    let engine = test_engine(&dir);

    let mut input = photosynthesis_input(2);
    input.id = Some("advbio_1".to_string());
    let result = engine.compute(input).await;

    assert!(result.error.is_none());
    assert!(!result
        .future_map
        .nodes
        .iter()
        .any(|n| n.id == "advbio_1"));
    // The rest of the subtree is untouched.
    assert!(result.future_map.nodes.iter().any(|n| n.id == "advbio_0"));
}

#[tokio::test]
async fn test_unresolvable_input_still_produces_valid_result() {
    let dir = TempDir::new().unwrap();
    write_reference_data(&dir);

    // A knowledge graph that knows nothing: every similarity degrades to
    // zero and the first field row wins by tie break.
    let kg = StubKg::new(&[], &[]);
    let engine =
        TemporalRelationEngine::new(test_config(&dir), kg, None, EngineCaches::default());

    let result = engine.compute(photosynthesis_input(2)).await;
    assert!(result.error.is_none());
    // Both maps still anchor on the synthetic input node.
    assert!(result
        .future_map
        .nodes
        .iter()
        .any(|n| n.id == "input_Photosynthesis"));
    assert!(result
        .past_map
        .nodes
        .iter()
        .any(|n| n.id == "input_Photosynthesis"));
}
