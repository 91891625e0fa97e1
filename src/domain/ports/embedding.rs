//! Embedding provider port for semantic vector generation.
//!
//! Implementations must map the same text to the same vector for a fixed model,
//! and every vector they return must have length [`EmbeddingProvider::dimension`].

use async_trait::async_trait;

use crate::domain::errors::DomainResult;

/// A single embedding request item.
#[derive(Debug, Clone)]
pub struct EmbeddingInput {
    /// Client-side ID for correlation.
    pub id: String,
    /// Text to embed.
    pub text: String,
}

impl EmbeddingInput {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// A single embedding result.
#[derive(Debug, Clone)]
pub struct EmbeddingOutput {
    /// Correlation ID matching the input.
    pub id: String,
    /// The embedding vector.
    pub vector: Vec<f32>,
}

/// Trait for hosted embedding providers.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Provider name (e.g., "gemini").
    fn name(&self) -> &'static str;

    /// Model identifier. Stored with each collection to detect model changes.
    fn model(&self) -> &str;

    /// Embedding dimension for this provider/model.
    fn dimension(&self) -> usize;

    /// Embed a search query.
    async fn embed(&self, text: &str) -> DomainResult<Vec<f32>>;

    /// Embed documents for storage, one output per input in input order.
    async fn embed_batch(&self, inputs: &[EmbeddingInput]) -> DomainResult<Vec<EmbeddingOutput>>;

    /// Maximum number of texts per single API call.
    fn max_batch_size(&self) -> usize;
}
