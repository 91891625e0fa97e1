//! Gemini embedding provider adapter.
//!
//! Documents go through `batchEmbedContents` with task type
//! `RETRIEVAL_DOCUMENT`; queries through `embedContent` with
//! `RETRIEVAL_QUERY`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{GeminiHttp, PROVIDER_NAME};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::ProviderConfig;
use crate::domain::ports::embedding::{EmbeddingInput, EmbeddingOutput, EmbeddingProvider};

/// Gemini's per-request limit for `batchEmbedContents`.
const GEMINI_MAX_BATCH: usize = 100;

#[derive(Debug, Clone)]
pub struct GeminiEmbeddingConfig {
    /// Embedding model. Default: `text-embedding-004`.
    pub model: String,
    /// Expected embedding dimension. Default: 768.
    pub dimension: usize,
    /// Maximum texts per single API request. Default: 100.
    pub max_batch_size: usize,
}

impl Default for GeminiEmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "text-embedding-004".to_string(),
            dimension: 768,
            max_batch_size: GEMINI_MAX_BATCH,
        }
    }
}

impl From<&ProviderConfig> for GeminiEmbeddingConfig {
    fn from(provider: &ProviderConfig) -> Self {
        Self {
            model: provider.embedding_model.clone(),
            dimension: provider.embedding_dimension,
            max_batch_size: provider.embedding_batch_size.clamp(1, GEMINI_MAX_BATCH),
        }
    }
}

/// Gemini embedding provider.
pub struct GeminiEmbeddingProvider {
    config: GeminiEmbeddingConfig,
    http: Arc<GeminiHttp>,
    model_path: String,
}

impl GeminiEmbeddingProvider {
    pub fn new(config: GeminiEmbeddingConfig, http: Arc<GeminiHttp>) -> Self {
        let model_path = GeminiHttp::model_path(&config.model);
        Self {
            config,
            http,
            model_path,
        }
    }

    fn content(&self, text: &str, task_type: &'static str) -> EmbedContentRequest {
        EmbedContentRequest {
            model: self.model_path.clone(),
            content: Content {
                parts: vec![Part { text: text.to_string() }],
            },
            task_type,
            output_dimensionality: self.config.dimension,
        }
    }

    fn check_dimension(&self, vector: &[f32], context: &str) -> DomainResult<()> {
        if vector.len() == self.config.dimension {
            Ok(())
        } else {
            Err(DomainError::DimensionMismatch {
                context: format!("{PROVIDER_NAME} {} {context}", self.config.model),
                expected: self.config.dimension,
                actual: vector.len(),
            })
        }
    }

    async fn call_batch_api(&self, texts: &[EmbeddingInput]) -> DomainResult<Vec<Vec<f32>>> {
        let endpoint = format!("{}:batchEmbedContents", self.model_path);
        let request = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|input| self.content(&input.text, "RETRIEVAL_DOCUMENT"))
                .collect(),
        };

        let response: BatchEmbedResponse = self.http.post_json(&endpoint, &request).await?;
        if response.embeddings.len() != texts.len() {
            return Err(DomainError::Provider {
                provider: PROVIDER_NAME.to_string(),
                endpoint,
                status: None,
                message: format!(
                    "expected {} embeddings, got {}",
                    texts.len(),
                    response.embeddings.len()
                ),
                transient: false,
            });
        }

        Ok(response.embeddings.into_iter().map(|e| e.values).collect())
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbeddingProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    async fn embed(&self, text: &str) -> DomainResult<Vec<f32>> {
        let endpoint = format!("{}:embedContent", self.model_path);
        let request = self.content(text, "RETRIEVAL_QUERY");
        let response: EmbedContentResponse = self.http.post_json(&endpoint, &request).await?;

        self.check_dimension(&response.embedding.values, "query embedding")?;
        Ok(response.embedding.values)
    }

    async fn embed_batch(&self, inputs: &[EmbeddingInput]) -> DomainResult<Vec<EmbeddingOutput>> {
        let mut all_outputs = Vec::with_capacity(inputs.len());

        for batch in inputs.chunks(self.config.max_batch_size.max(1)) {
            let vectors = self.call_batch_api(batch).await?;

            for (input, vector) in batch.iter().zip(vectors) {
                self.check_dimension(&vector, &format!("document embedding {}", input.id))?;
                all_outputs.push(EmbeddingOutput {
                    id: input.id.clone(),
                    vector,
                });
            }
        }

        Ok(all_outputs)
    }

    fn max_batch_size(&self) -> usize {
        self.config.max_batch_size
    }
}

// -- Gemini API request/response types --

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest {
    model: String,
    content: Content,
    task_type: &'static str,
    output_dimensionality: usize,
}

#[derive(Debug, Serialize)]
struct BatchEmbedRequest {
    requests: Vec<EmbedContentRequest>,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    #[serde(default)]
    values: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<ContentEmbedding>,
}
