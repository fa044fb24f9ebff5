//! Final map assembly.
//!
//! Merges per-subject subtrees into a single graph anchored to a synthetic
//! input node, deduplicating nodes by id (first occurrence wins) and edges
//! by their `(source, target)` pair.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dataset::MasterRecord;
use crate::features::ConceptFeature;
use crate::subgraph::{self, ExtractionOptions};

/// Group label of the synthetic input node.
pub const INPUT_GROUP: &str = "Input";

/// A node of the final output graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputNode {
    pub id: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentence: Option<String>,
    /// Subject label the node came from, or [`INPUT_GROUP`].
    pub group: String,
    /// Identifier list carried on the input node for follow-up queries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extend_query: Option<Vec<String>>,
}

/// A directed edge of the final output graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutputEdge {
    pub source: String,
    pub target: String,
}

/// One direction's assembled knowledge map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemporalMap {
    pub nodes: Vec<OutputNode>,
    pub edges: Vec<OutputEdge>,
}

impl TemporalMap {
    /// The empty map returned alongside top-level errors.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Remove a node by id (used to keep the caller's base concept from
    /// reappearing as a discovered relation).
    pub fn remove_node(&mut self, id: &str) {
        self.nodes.retain(|node| node.id != id);
    }
}

/// Id of the synthetic input node for a given label.
pub fn synthetic_input_id(label: &str) -> String {
    format!("input_{}", label)
}

/// Assemble one direction's map from the selected subjects.
///
/// Subjects are processed in selection order; a subject whose subtree
/// extraction fails is skipped silently. Zero surviving subtrees yield a
/// map with only the synthetic input node, which is a valid result.
pub fn assemble_map(
    input: &ConceptFeature,
    subjects: &[&MasterRecord],
    maps_dir: &Path,
    options: ExtractionOptions,
) -> TemporalMap {
    let input_id = synthetic_input_id(&input.label);

    let mut extend_query: Vec<String> = input
        .identifiers
        .iter()
        .map(|id| id.as_str().to_string())
        .collect();
    extend_query.sort();

    let mut nodes = vec![OutputNode {
        id: input_id.clone(),
        label: input.label.clone(),
        sentence: None,
        group: INPUT_GROUP.to_string(),
        extend_query: Some(extend_query),
    }];
    let mut edges: Vec<OutputEdge> = Vec::new();

    for subject in subjects {
        let Some(subtree) = subgraph::extract_from_dir(input, maps_dir, &subject.label, options)
        else {
            tracing::info!(subject = %subject.label, "subject contributed no subtree; skipping");
            continue;
        };

        for node in &subtree.nodes {
            nodes.push(OutputNode {
                id: node.id.clone(),
                label: node.label.clone(),
                sentence: node.sentence.clone(),
                group: subject.label.clone(),
                extend_query: None,
            });
        }

        // Connector from the synthetic input to the subtree's entry point,
        // then the subtree's own edges.
        edges.push(OutputEdge {
            source: input_id.clone(),
            target: subtree.entry_point_id.clone(),
        });
        for edge in &subtree.edges {
            edges.push(OutputEdge {
                source: edge.source.clone(),
                target: edge.target.clone(),
            });
        }
    }

    dedup(&mut nodes, &mut edges);
    TemporalMap { nodes, edges }
}

/// First occurrence wins for nodes; edges dedup on `(source, target)`.
fn dedup(nodes: &mut Vec<OutputNode>, edges: &mut Vec<OutputEdge>) {
    let mut seen_nodes: HashSet<String> = HashSet::new();
    nodes.retain(|node| seen_nodes.insert(node.id.clone()));

    let mut seen_edges: HashSet<(String, String)> = HashSet::new();
    edges.retain(|edge| seen_edges.insert((edge.source.clone(), edge.target.clone())));
}
