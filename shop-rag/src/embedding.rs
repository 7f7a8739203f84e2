//! Embedding provider seam.

use async_trait::async_trait;

use crate::error::Result;

/// Converts text into fixed-dimension vectors using an external model.
///
/// Failures must surface as [`RagError::EmbeddingError`](crate::RagError::EmbeddingError);
/// an implementation never substitutes placeholder vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts, returning one vector per input in input order.
    ///
    /// Calls [`embed`](EmbeddingProvider::embed) sequentially by default.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }

    /// Length of the vectors this provider produces.
    fn dimensions(&self) -> usize;
}
