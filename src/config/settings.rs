//! Configuration settings for the chronomap engine.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub datasets: DatasetConfig,
    pub knowledge_graph: KnowledgeGraphConfig,
    pub embedding: EmbeddingConfig,
    pub selection: SelectionConfig,
    pub cache: CacheConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            datasets: DatasetConfig::default(),
            knowledge_graph: KnowledgeGraphConfig::default(),
            embedding: EmbeddingConfig::default(),
            selection: SelectionConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::ReadFile)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default locations or use defaults.
    pub fn load() -> Result<Self> {
        let config_paths = [
            // Current directory
            PathBuf::from("config.toml"),
            PathBuf::from("chronomap.toml"),
            // User config directory
            dirs::config_dir()
                .map(|p| p.join("chronomap/config.toml"))
                .unwrap_or_default(),
            // Home directory
            dirs::home_dir()
                .map(|p| p.join(".chronomap/config.toml"))
                .unwrap_or_default(),
        ];

        for path in &config_paths {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Config::default())
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<()> {
        if self.knowledge_graph.enabled {
            if self.knowledge_graph.api_endpoint.is_empty() {
                return Err(
                    ConfigError::MissingField("knowledge_graph.api_endpoint".to_string()).into(),
                );
            }
            if self.knowledge_graph.sparql_endpoint.is_empty() {
                return Err(
                    ConfigError::MissingField("knowledge_graph.sparql_endpoint".to_string()).into(),
                );
            }
        }

        if self.embedding.enabled && self.embedding.base_url.is_empty() {
            return Err(ConfigError::MissingField("embedding.base_url".to_string()).into());
        }

        if self.selection.top_k_subjects == 0 {
            return Err(ConfigError::Invalid("top_k_subjects must be > 0".to_string()).into());
        }
        if self.selection.top_n_nodes_in_subgraph == 0 {
            return Err(
                ConfigError::Invalid("top_n_nodes_in_subgraph must be > 0".to_string()).into(),
            );
        }

        Ok(())
    }

    /// Expanded path to the academic fields dataset.
    pub fn fields_path(&self) -> PathBuf {
        expand(&self.datasets.fields_path)
    }

    /// Expanded path to the subjects dataset.
    pub fn subjects_path(&self) -> PathBuf {
        expand(&self.datasets.subjects_path)
    }

    /// Expanded path to the per-subject map directory.
    pub fn subject_maps_dir(&self) -> PathBuf {
        expand(&self.datasets.subject_maps_dir)
    }
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

/// Reference dataset locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// CSV file with one row per academic field.
    pub fields_path: String,
    /// CSV file with one row per subject (carries the `year` column).
    pub subjects_path: String,
    /// Directory holding `subject_map_<label>_nodes.csv` / `_edges.csv` pairs.
    pub subject_maps_dir: String,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            fields_path: "./data/academic_fields.csv".to_string(),
            subjects_path: "./data/subjects.csv".to_string(),
            subject_maps_dir: "./data/subject_maps".to_string(),
        }
    }
}

/// Knowledge-graph provider configuration (Wikidata).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeGraphConfig {
    /// Whether the external knowledge graph is consulted at all.
    pub enabled: bool,
    /// Entity search endpoint (wbsearchentities).
    pub api_endpoint: String,
    /// SPARQL endpoint for neighbor expansion.
    pub sparql_endpoint: String,
    /// Working language for entity search.
    pub language: String,
    /// User agent sent with every request.
    pub user_agent: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Delay inserted between successive external queries, in milliseconds.
    pub request_delay_ms: u64,
    /// At most this many identifiers are expanded per neighbor lookup.
    pub max_ids_to_expand: usize,
    /// Neighbor count limit per query.
    pub neighbor_limit: usize,
}

impl Default for KnowledgeGraphConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_endpoint: "https://www.wikidata.org/w/api.php".to_string(),
            sparql_endpoint: "https://query.wikidata.org/sparql".to_string(),
            language: "ja".to_string(),
            user_agent: "chronomap/0.1".to_string(),
            timeout_secs: 30,
            request_delay_ms: 50,
            max_ids_to_expand: 7,
            neighbor_limit: 15,
        }
    }
}

/// Embedding API configuration (OpenAI-compatible).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Whether an embedding provider should be constructed.
    pub enabled: bool,
    /// Base URL for the embedding API.
    pub base_url: String,
    /// Model name.
    pub model: String,
    /// API key (loaded from the OPENAI_API_KEY environment variable if not set).
    pub api_key: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "text-embedding-3-small".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

/// Knobs for field/subject selection and subtree extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// How many subjects are selected per year direction.
    pub top_k_subjects: usize,
    /// Node cap for root-anchored subtree extraction.
    pub top_n_nodes_in_subgraph: usize,
    /// Minimum entry-point similarity for a subject to contribute a subtree.
    pub similarity_threshold: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            top_k_subjects: 1,
            top_n_nodes_in_subgraph: 5,
            similarity_threshold: 0.0,
        }
    }
}

/// Bounded cache capacities for external lookups.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Entity-resolution cache (term -> identifier).
    pub resolution_capacity: u64,
    /// Term-list resolution cache (terms -> identifier set).
    pub term_list_capacity: u64,
    /// Neighbor-expansion cache (identifier set -> neighbor set).
    pub neighbor_capacity: u64,
    /// Embedding cache (text -> vector).
    pub embedding_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            resolution_capacity: 16384,
            term_list_capacity: 8192,
            neighbor_capacity: 8192,
            embedding_capacity: 16384,
        }
    }
}
