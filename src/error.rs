//! Error types for the chronomap engine.

use thiserror::Error;

/// Main error type for chronomap operations.
#[derive(Error, Debug)]
pub enum ChronomapError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    #[error("Knowledge graph error: {0}")]
    KnowledgeGraph(#[from] KnowledgeGraphError),

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("No similar academic field could be determined")]
    NoFieldMatch,
}

/// Configuration-related errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Reference-dataset errors (master tables, subject maps).
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Reference dataset not found: {0}")]
    NotFound(String),

    #[error("Failed to read dataset {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: csv::Error,
    },
}

/// Knowledge-graph provider errors (entity search, SPARQL expansion).
#[derive(Error, Debug)]
pub enum KnowledgeGraphError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Unexpected response ({status}): {body}")]
    Response { status: u16, body: String },
}

/// Embedding provider errors.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("API key not provided and no environment fallback set")]
    MissingApiKey,
}

/// Result type alias for chronomap operations.
pub type Result<T> = std::result::Result<T, ChronomapError>;
