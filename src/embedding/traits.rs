//! Embedding trait definitions.

use async_trait::async_trait;

/// Trait for embedding providers.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> crate::error::Result<Vec<f32>>;

    /// Return the embedding dimension.
    fn dimension(&self) -> usize;
}
