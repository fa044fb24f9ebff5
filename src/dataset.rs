//! Reference dataset loading.
//!
//! Master tables (academic fields, subjects) and per-subject concept maps
//! are read from CSV. Optional columns are lenient by design: malformed or
//! missing identifier sets and embeddings degrade to empty set / absent
//! vector at load time, so downstream code never branches on column
//! presence. Missing subject-map files are a per-subject soft failure.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::error::{DatasetError, Result};
use crate::kg::EntityId;
use crate::similarity::ConceptSignature;

/// Id suffix marking a subject map's root node.
pub const ROOT_SUFFIX: &str = "_0";

/// One row of a master table (academic field or subject).
#[derive(Debug, Clone)]
pub struct MasterRecord {
    pub label: String,
    /// School-year position; only meaningful for subject rows.
    pub year: Option<i32>,
    pub identifiers: HashSet<EntityId>,
    pub neighbors: HashSet<EntityId>,
    pub embedding: Option<Vec<f32>>,
}

impl MasterRecord {
    /// Scoring view of this row. Master rows carry no representative
    /// identifier; path scoring falls back to set intersection.
    pub fn signature(&self) -> ConceptSignature<'_> {
        ConceptSignature {
            representative_id: None,
            identifiers: &self.identifiers,
            neighbors: &self.neighbors,
            embedding: self.embedding.as_deref(),
        }
    }
}

/// One node of a subject's precomputed concept tree.
#[derive(Debug, Clone)]
pub struct SubjectMapNode {
    pub id: String,
    pub label: String,
    pub sentence: Option<String>,
    pub representative_id: Option<EntityId>,
    pub identifiers: HashSet<EntityId>,
    pub neighbors: HashSet<EntityId>,
    pub embedding: Option<Vec<f32>>,
    /// Resolved once at load from the id suffix convention.
    pub is_root: bool,
}

impl SubjectMapNode {
    pub fn signature(&self) -> ConceptSignature<'_> {
        ConceptSignature {
            representative_id: self.representative_id.as_ref(),
            identifiers: &self.identifiers,
            neighbors: &self.neighbors,
            embedding: self.embedding.as_deref(),
        }
    }
}

/// One parent-child edge of a subject's concept tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectMapEdge {
    pub source: String,
    pub target: String,
}

/// A subject's concept tree: node table plus edge table.
#[derive(Debug, Clone)]
pub struct SubjectMap {
    pub nodes: Vec<SubjectMapNode>,
    pub edges: Vec<SubjectMapEdge>,
}

/// Raw master row as found in the CSV; every column optional.
#[derive(Debug, Deserialize)]
struct MasterRow {
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    year: Option<String>,
    #[serde(default)]
    all_node_qids: Option<String>,
    #[serde(default)]
    neighboring_qids: Option<String>,
    #[serde(default)]
    embedding_openai: Option<String>,
}

/// Raw subject-map node row.
#[derive(Debug, Deserialize)]
struct NodeRow {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    sentence: Option<String>,
    #[serde(default)]
    representative_qid: Option<String>,
    #[serde(default)]
    all_node_qids: Option<String>,
    #[serde(default)]
    neighboring_qids: Option<String>,
    #[serde(default)]
    embedding_openai: Option<String>,
}

/// Raw edge row; some exports name the columns `from`/`to`.
#[derive(Debug, Deserialize)]
struct EdgeRow {
    #[serde(default, alias = "from")]
    source: Option<String>,
    #[serde(default, alias = "to")]
    target: Option<String>,
}

/// Load a master table. A missing file is a configuration error surfaced
/// to the caller; malformed rows are skipped with a warning.
pub fn load_master_records(path: &Path) -> Result<Vec<MasterRecord>> {
    if !path.exists() {
        return Err(DatasetError::NotFound(path.display().to_string()).into());
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| DatasetError::Read {
            path: path.display().to_string(),
            source: e,
        })?;

    let mut records = Vec::new();
    for row in reader.deserialize::<MasterRow>() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping malformed master row");
                continue;
            }
        };
        records.push(MasterRecord {
            label: row.label.unwrap_or_default(),
            year: parse_year(row.year.as_deref()),
            identifiers: parse_id_set(row.all_node_qids.as_deref()),
            neighbors: parse_id_set(row.neighboring_qids.as_deref()),
            embedding: parse_embedding(row.embedding_openai.as_deref()),
        });
    }

    Ok(records)
}

/// Load one subject's concept tree from `subject_map_<label>_nodes.csv` /
/// `subject_map_<label>_edges.csv` under `dir`.
///
/// Returns `None` when the node table is missing or empty; a missing edge
/// table degrades to an edge-less map. Never an error: a subject that
/// cannot be loaded simply contributes nothing.
pub fn load_subject_map(dir: &Path, subject_label: &str) -> Option<SubjectMap> {
    let nodes_path = dir.join(format!("subject_map_{}_nodes.csv", subject_label));
    let edges_path = dir.join(format!("subject_map_{}_edges.csv", subject_label));

    let nodes = match load_nodes(&nodes_path) {
        Ok(nodes) => nodes,
        Err(e) => {
            tracing::warn!(subject = subject_label, error = %e, "subject map nodes unavailable");
            return None;
        }
    };
    if nodes.is_empty() {
        tracing::info!(subject = subject_label, "subject map has no nodes");
        return None;
    }

    let edges = match load_edges(&edges_path) {
        Ok(edges) => edges,
        Err(e) => {
            tracing::warn!(subject = subject_label, error = %e, "subject map edges unavailable");
            Vec::new()
        }
    };

    Some(SubjectMap { nodes, edges })
}

fn load_nodes(path: &Path) -> Result<Vec<SubjectMapNode>> {
    if !path.exists() {
        return Err(DatasetError::NotFound(path.display().to_string()).into());
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| DatasetError::Read {
            path: path.display().to_string(),
            source: e,
        })?;

    let mut nodes = Vec::new();
    for row in reader.deserialize::<NodeRow>() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping malformed node row");
                continue;
            }
        };
        let Some(id) = row.id.filter(|id| !id.is_empty()) else {
            continue;
        };
        let is_root = id.ends_with(ROOT_SUFFIX);
        nodes.push(SubjectMapNode {
            is_root,
            id,
            label: row.label.unwrap_or_default(),
            sentence: row.sentence.filter(|s| !s.is_empty()),
            representative_id: row
                .representative_qid
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .map(EntityId::from),
            identifiers: parse_id_set(row.all_node_qids.as_deref()),
            neighbors: parse_id_set(row.neighboring_qids.as_deref()),
            embedding: parse_embedding(row.embedding_openai.as_deref()),
        });
    }

    Ok(nodes)
}

fn load_edges(path: &Path) -> Result<Vec<SubjectMapEdge>> {
    if !path.exists() {
        return Err(DatasetError::NotFound(path.display().to_string()).into());
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| DatasetError::Read {
            path: path.display().to_string(),
            source: e,
        })?;

    let mut edges = Vec::new();
    for row in reader.deserialize::<EdgeRow>() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping malformed edge row");
                continue;
            }
        };
        let (Some(source), Some(target)) = (row.source, row.target) else {
            continue;
        };
        if source.is_empty() || target.is_empty() {
            continue;
        }
        edges.push(SubjectMapEdge { source, target });
    }

    Ok(edges)
}

/// Comma-joined identifier column -> set. Blank and malformed cells are
/// the empty set.
fn parse_id_set(raw: Option<&str>) -> HashSet<EntityId> {
    raw.map(|cell| {
        cell.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(EntityId::from)
            .collect()
    })
    .unwrap_or_default()
}

/// JSON array embedding column -> vector. Anything else is absent.
fn parse_embedding(raw: Option<&str>) -> Option<Vec<f32>> {
    let cell = raw?.trim();
    if !cell.starts_with('[') {
        return None;
    }
    serde_json::from_str(cell).ok()
}

/// Lenient year parse; tolerates float-formatted exports like "3.0".
fn parse_year(raw: Option<&str>) -> Option<i32> {
    let cell = raw?.trim();
    if cell.is_empty() {
        return None;
    }
    cell.parse::<i32>()
        .ok()
        .or_else(|| cell.parse::<f64>().ok().map(|v| v as i32))
}
