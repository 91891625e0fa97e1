//! Generation client port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;

/// A hosted generative model: prompt in, text out.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Provider name (e.g., "gemini").
    fn name(&self) -> &'static str;

    /// Model identifier.
    fn model(&self) -> &str;

    /// Generate a completion for `prompt`. Transient failures surface as
    /// [`DomainError::Provider`](crate::domain::errors::DomainError::Provider)
    /// with `transient: true` or as `Timeout`.
    async fn generate(&self, prompt: &str) -> DomainResult<String>;
}
