//! In-crate fakes for service unit tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::adapters::sqlite::{initialize_test_database, SqliteVectorStore};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{BoundaryKind, Chunk, ChunkMetadata, EmbeddedChunk};
use crate::domain::ports::{EmbeddingInput, EmbeddingOutput, EmbeddingProvider, GenerationClient};

pub async fn memory_store() -> Arc<SqliteVectorStore> {
    Arc::new(SqliteVectorStore::new(initialize_test_database().await.unwrap()))
}

pub fn embedded(text: &str, vector: Vec<f32>) -> EmbeddedChunk {
    EmbeddedChunk::new(
        Chunk::new(
            text.to_string(),
            ChunkMetadata::new("policy.txt", 0, text.chars().count(), BoundaryKind::EndOfDocument),
            0,
        ),
        vector,
    )
}

/// Deterministic embedder: bag of lowercase words hashed into `dimension`
/// buckets, unless a vector was pinned for the exact text.
pub struct FixedEmbedder {
    dimension: usize,
    model: String,
    pinned: HashMap<String, Vec<f32>>,
    calls: AtomicUsize,
    fail_after: Option<usize>,
}

impl FixedEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            model: "fixed-model".to_string(),
            pinned: HashMap::new(),
            calls: AtomicUsize::new(0),
            fail_after: None,
        }
    }

    pub fn with(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.pinned.insert(text.to_string(), vector);
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// Fail every call after the first `calls` succeeded.
    pub fn failing_after(mut self, calls: usize) -> Self {
        self.fail_after = Some(calls);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vector(&self, text: &str) -> Vec<f32> {
        if let Some(v) = self.pinned.get(text) {
            return v.clone();
        }
        let mut v = vec![0.0; self.dimension];
        for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
            let bucket = word
                .to_lowercase()
                .bytes()
                .fold(7usize, |h, b| h.wrapping_mul(31).wrapping_add(b as usize));
            v[bucket % self.dimension] += 1.0;
        }
        v
    }

    fn record_call(&self) -> DomainResult<()> {
        let previous = self.calls.fetch_add(1, Ordering::SeqCst);
        match self.fail_after {
            Some(limit) if previous >= limit => Err(DomainError::Provider {
                provider: "fixed".to_string(),
                endpoint: "embed".to_string(),
                status: Some(503),
                message: "unavailable".to_string(),
                transient: true,
            }),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for FixedEmbedder {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> DomainResult<Vec<f32>> {
        self.record_call()?;
        Ok(self.vector(text))
    }

    async fn embed_batch(&self, inputs: &[EmbeddingInput]) -> DomainResult<Vec<EmbeddingOutput>> {
        self.record_call()?;
        Ok(inputs
            .iter()
            .map(|i| EmbeddingOutput {
                id: i.id.clone(),
                vector: self.vector(&i.text),
            })
            .collect())
    }

    fn max_batch_size(&self) -> usize {
        2
    }
}

/// Generation client with a scripted outcome that records every prompt.
pub struct ScriptedGenerator {
    outcome: Outcome,
    prompts: Mutex<Vec<String>>,
}

enum Outcome {
    Answer(String),
    Transient,
    Sleep(Duration),
}

impl ScriptedGenerator {
    pub fn answering(answer: &str) -> Self {
        Self::with_outcome(Outcome::Answer(answer.to_string()))
    }

    pub fn unavailable() -> Self {
        Self::with_outcome(Outcome::Transient)
    }

    pub fn hanging(delay: Duration) -> Self {
        Self::with_outcome(Outcome::Sleep(delay))
    }

    fn with_outcome(outcome: Outcome) -> Self {
        Self {
            outcome,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationClient for ScriptedGenerator {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn generate(&self, prompt: &str) -> DomainResult<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.outcome {
            Outcome::Answer(answer) => Ok(answer.clone()),
            Outcome::Transient => Err(DomainError::Provider {
                provider: "scripted".to_string(),
                endpoint: "generate".to_string(),
                status: Some(429),
                message: "quota exceeded".to_string(),
                transient: true,
            }),
            Outcome::Sleep(delay) => {
                tokio::time::sleep(*delay).await;
                Ok("too late".to_string())
            }
        }
    }
}
