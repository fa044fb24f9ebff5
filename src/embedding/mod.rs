//! Embedding module for vector embeddings.
//!
//! Maps text to a fixed-dimension vector through an OpenAI-compatible API.
//! The provider is optional: when unconfigured, every dependent cosine term
//! degrades to zero instead of failing.

mod api;
mod traits;

pub use api::ApiEmbeddingProvider;
pub use traits::EmbeddingProvider;

use std::sync::Arc;

use crate::config::EmbeddingConfig;
use crate::error::Result;

/// Create an embedding provider from configuration.
///
/// Returns `None` when embeddings are disabled or no API key is available;
/// the engine then simply runs without the embedding sub-score.
pub fn create_provider(config: &EmbeddingConfig) -> Result<Option<Arc<dyn EmbeddingProvider>>> {
    if !config.enabled {
        return Ok(None);
    }

    match ApiEmbeddingProvider::from_config(config) {
        Ok(provider) => Ok(Some(Arc::new(provider))),
        Err(e) => {
            tracing::warn!(error = %e, "embedding provider unavailable; cosine scores degrade to zero");
            Ok(None)
        }
    }
}
