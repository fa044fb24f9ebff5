//! Subtree extraction from per-subject concept trees.
//!
//! Every node of the subject's tree is scored against the input concept;
//! the best match becomes the entry point. When the entry point is the
//! tree's root, the subtree is the top-N most similar of the root and its
//! direct children. When it is an interior node, the subtree is the path
//! walked upward from the entry point to the root: a deep match should
//! surface its ancestry, not its siblings.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::dataset::{self, SubjectMap, SubjectMapEdge, SubjectMapNode};
use crate::features::ConceptFeature;
use crate::similarity::composite;

/// Knobs for subtree extraction.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionOptions {
    /// Node cap for the root-anchored strategy.
    pub top_n_nodes: usize,
    /// Minimum entry-point similarity; below it the subject contributes
    /// nothing. The default configuration sets this to 0.0, which keeps
    /// the branch effectively dormant, but it stays a tunable knob.
    pub similarity_threshold: f64,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            top_n_nodes: 5,
            similarity_threshold: 0.0,
        }
    }
}

/// The extracted subtree and its connection point.
#[derive(Debug, Clone)]
pub struct SubtreeResult {
    pub nodes: Vec<SubjectMapNode>,
    pub edges: Vec<SubjectMapEdge>,
    /// Id of the subject-map node most similar to the input.
    pub entry_point_id: String,
}

/// Load a subject's map from `dir` and extract its most relevant subtree.
///
/// Missing subject files and below-threshold matches return `None`; the
/// subject is simply omitted from the result.
pub fn extract_from_dir(
    input: &ConceptFeature,
    dir: &Path,
    subject_label: &str,
    options: ExtractionOptions,
) -> Option<SubtreeResult> {
    tracing::info!(subject = subject_label, "extracting subtree from subject map");
    let map = dataset::load_subject_map(dir, subject_label)?;
    extract_subtree(input, &map, options)
}

/// Extract the subtree of `map` most relevant to the input concept.
pub fn extract_subtree(
    input: &ConceptFeature,
    map: &SubjectMap,
    options: ExtractionOptions,
) -> Option<SubtreeResult> {
    if map.nodes.is_empty() {
        return None;
    }

    let input_sig = input.signature();
    let scores: Vec<f64> = map
        .nodes
        .iter()
        .map(|node| composite(&input_sig, &node.signature()))
        .collect();

    // Arg-max with first-occurrence tie break.
    let (entry_idx, &entry_score) = scores
        .iter()
        .enumerate()
        .fold(None::<(usize, &f64)>, |best, (i, s)| match best {
            Some((_, bs)) if s <= bs => best,
            _ => Some((i, s)),
        })?;

    let entry = &map.nodes[entry_idx];
    if entry_score < options.similarity_threshold {
        tracing::info!(
            entry = %entry.id,
            score = entry_score,
            threshold = options.similarity_threshold,
            "best match below threshold; subject contributes nothing"
        );
        return None;
    }

    let (nodes, edges) = if entry.is_root {
        tracing::debug!(entry = %entry.id, "entry point is the subject root");
        extract_root_neighborhood(map, entry_idx, &scores, options.top_n_nodes)
    } else {
        tracing::debug!(entry = %entry.id, "entry point is an interior node");
        extract_path_to_root(map, entry_idx)
    };

    if nodes.is_empty() {
        return None;
    }

    tracing::info!(
        entry = %entry.id,
        nodes = nodes.len(),
        edges = edges.len(),
        "extracted subtree"
    );

    Some(SubtreeResult {
        nodes,
        edges,
        entry_point_id: map.nodes[entry_idx].id.clone(),
    })
}

/// Root case: candidate set is the root plus its direct children; keep the
/// top-N by similarity and only edges internal to the kept set.
fn extract_root_neighborhood(
    map: &SubjectMap,
    entry_idx: usize,
    scores: &[f64],
    top_n: usize,
) -> (Vec<SubjectMapNode>, Vec<SubjectMapEdge>) {
    let entry_id = &map.nodes[entry_idx].id;

    let child_ids: HashSet<&str> = map
        .edges
        .iter()
        .filter(|e| &e.source == entry_id)
        .map(|e| e.target.as_str())
        .collect();

    let mut candidates: Vec<usize> = map
        .nodes
        .iter()
        .enumerate()
        .filter(|(i, node)| *i == entry_idx || child_ids.contains(node.id.as_str()))
        .map(|(i, _)| i)
        .collect();

    // Stable sort: ties keep dataset order.
    candidates.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    candidates.truncate(top_n);

    let kept_ids: HashSet<&str> = candidates.iter().map(|&i| map.nodes[i].id.as_str()).collect();
    let nodes: Vec<SubjectMapNode> = candidates.iter().map(|&i| map.nodes[i].clone()).collect();
    let edges: Vec<SubjectMapEdge> = map
        .edges
        .iter()
        .filter(|e| kept_ids.contains(e.source.as_str()) && kept_ids.contains(e.target.as_str()))
        .cloned()
        .collect();

    (nodes, edges)
}

/// Interior case: walk upward from the entry point following the first
/// incoming edge per node until the root is reached or no parent exists.
/// The walk is bounded by the total node count so a malformed or cyclic
/// edge table cannot loop forever.
fn extract_path_to_root(
    map: &SubjectMap,
    entry_idx: usize,
) -> (Vec<SubjectMapNode>, Vec<SubjectMapEdge>) {
    let by_id: HashMap<&str, usize> = map
        .nodes
        .iter()
        .enumerate()
        .map(|(i, node)| (node.id.as_str(), i))
        .collect();

    let mut visited_ids: HashSet<String> = HashSet::new();
    let mut nodes: Vec<SubjectMapNode> = Vec::new();
    let mut edges: Vec<SubjectMapEdge> = Vec::new();
    let mut seen_edges: HashSet<(String, String)> = HashSet::new();

    let mut current_id = map.nodes[entry_idx].id.clone();
    for _ in 0..map.nodes.len() {
        let Some(&idx) = by_id.get(current_id.as_str()) else {
            break;
        };
        let node = &map.nodes[idx];
        if visited_ids.insert(node.id.clone()) {
            nodes.push(node.clone());
        }

        if node.is_root {
            break;
        }

        // The tree invariant promises at most one parent; tolerate
        // violations by taking the first matching edge.
        let Some(parent_edge) = map.edges.iter().find(|e| e.target == current_id) else {
            break;
        };
        if seen_edges.insert((parent_edge.source.clone(), parent_edge.target.clone())) {
            edges.push(parent_edge.clone());
        }
        current_id = parent_edge.source.clone();
    }

    (nodes, edges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kg::EntityId;

    fn node(id: &str, identifiers: &[&str]) -> SubjectMapNode {
        SubjectMapNode {
            id: id.to_string(),
            label: id.to_string(),
            sentence: None,
            representative_id: identifiers.first().map(|s| EntityId::from(*s)),
            identifiers: identifiers.iter().map(|s| EntityId::from(*s)).collect(),
            neighbors: HashSet::new(),
            embedding: None,
            is_root: id.ends_with(dataset::ROOT_SUFFIX),
        }
    }

    fn edge(source: &str, target: &str) -> SubjectMapEdge {
        SubjectMapEdge {
            source: source.to_string(),
            target: target.to_string(),
        }
    }

    fn input(identifiers: &[&str]) -> ConceptFeature {
        ConceptFeature {
            label: "input".to_string(),
            representative_id: identifiers.first().map(|s| EntityId::from(*s)),
            identifiers: identifiers.iter().map(|s| EntityId::from(*s)).collect(),
            neighbors: HashSet::new(),
            embedding: None,
        }
    }

    /// Root matches best; many children, only top-N survive.
    #[test]
    fn test_root_case_caps_nodes_and_restricts_edges() {
        let mut nodes = vec![node("s_0", &["Q1"])];
        let mut edges = Vec::new();
        for i in 1..=8 {
            let id = format!("s_{}", i);
            // Children share a weaker overlap with the input.
            nodes.push(node(&id, &["Q2"]));
            edges.push(edge("s_0", &id));
        }
        let map = SubjectMap { nodes, edges };
        let input = input(&["Q1", "Q2"]);

        let result = extract_subtree(&input, &map, ExtractionOptions::default()).unwrap();

        assert_eq!(result.entry_point_id, "s_0");
        assert!(result.nodes.len() <= 5);
        // The root scores highest and must be kept.
        assert!(result.nodes.iter().any(|n| n.id == "s_0"));

        let kept: HashSet<&str> = result.nodes.iter().map(|n| n.id.as_str()).collect();
        for e in &result.edges {
            assert!(kept.contains(e.source.as_str()));
            assert!(kept.contains(e.target.as_str()));
        }
    }

    /// Interior match walks to the root, collecting the ancestry path.
    #[test]
    fn test_interior_case_surfaces_ancestry() {
        let map = SubjectMap {
            nodes: vec![
                node("s_0", &["Q9"]),
                node("s_1", &["Q8"]),
                node("s_2", &["Q1"]),
                node("s_3", &["Q7"]),
            ],
            edges: vec![edge("s_0", "s_1"), edge("s_1", "s_2"), edge("s_0", "s_3")],
        };
        let input = input(&["Q1"]);

        let result = extract_subtree(&input, &map, ExtractionOptions::default()).unwrap();

        assert_eq!(result.entry_point_id, "s_2");
        let path_ids: Vec<&str> = result.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(path_ids, vec!["s_2", "s_1", "s_0"]);
        assert_eq!(result.edges.len(), 2);
        // The sibling branch is not part of the path.
        assert!(!path_ids.contains(&"s_3"));
        // The root is included once the walk reaches it.
        assert!(result.nodes.iter().any(|n| n.is_root));
    }

    /// A cyclic edge table must terminate within the node-count bound.
    #[test]
    fn test_interior_case_terminates_on_cycle() {
        let map = SubjectMap {
            nodes: vec![node("s_1", &["Q1"]), node("s_2", &["Q5"])],
            edges: vec![edge("s_2", "s_1"), edge("s_1", "s_2")],
        };
        let input = input(&["Q1"]);

        let result = extract_subtree(&input, &map, ExtractionOptions::default()).unwrap();
        // Both nodes collected; the walk stops at the bound without looping.
        assert_eq!(result.nodes.len(), 2);
    }

    /// No parent edge: the path is just the entry point.
    #[test]
    fn test_interior_case_without_parent_edge() {
        let map = SubjectMap {
            nodes: vec![node("s_0", &["Q9"]), node("s_5", &["Q1"])],
            edges: vec![],
        };
        let input = input(&["Q1"]);

        let result = extract_subtree(&input, &map, ExtractionOptions::default()).unwrap();
        assert_eq!(result.entry_point_id, "s_5");
        assert_eq!(result.nodes.len(), 1);
        assert!(result.edges.is_empty());
    }

    #[test]
    fn test_threshold_aborts_extraction() {
        let map = SubjectMap {
            nodes: vec![node("s_0", &["Q9"])],
            edges: vec![],
        };
        let input = input(&["Q1"]);

        let options = ExtractionOptions {
            similarity_threshold: 0.5,
            ..ExtractionOptions::default()
        };
        assert!(extract_subtree(&input, &map, options).is_none());
    }

    #[test]
    fn test_entry_point_tie_takes_first_node() {
        let map = SubjectMap {
            nodes: vec![node("s_1", &["Q1"]), node("s_2", &["Q1"])],
            edges: vec![],
        };
        let input = input(&["Q1"]);

        let result = extract_subtree(&input, &map, ExtractionOptions::default()).unwrap();
        assert_eq!(result.entry_point_id, "s_1");
    }

    #[test]
    fn test_missing_subject_files_return_none() {
        let dir = tempfile::TempDir::new().unwrap();
        let input = input(&["Q1"]);
        assert!(extract_from_dir(&input, dir.path(), "Ghost", ExtractionOptions::default()).is_none());
    }

    /// Root entry with no edge table at all still yields the root alone.
    #[test]
    fn test_root_case_without_edges() {
        let map = SubjectMap {
            nodes: vec![node("s_0", &["Q1"]), node("s_9", &["Q8"])],
            edges: vec![],
        };
        let input = input(&["Q1"]);

        let result = extract_subtree(&input, &map, ExtractionOptions::default()).unwrap();
        assert_eq!(result.nodes.len(), 1);
        assert_eq!(result.nodes[0].id, "s_0");
    }
}
