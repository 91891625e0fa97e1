//! Common test utilities for integration tests
//!
//! Deterministic provider fakes, policy directory fixtures and log capture
//! shared across the integration test files.

#![allow(dead_code)]

use async_trait::async_trait;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

use policy_rag::adapters::sqlite::{initialize_test_database, SqliteVectorStore};
use policy_rag::domain::ports::{EmbeddingInput, EmbeddingOutput};
use policy_rag::{DomainError, DomainResult, EmbeddingProvider, GenerationClient};

pub const REFUND_POLICY: &str = "Refunds are processed within 14 days. Contact support at 555-0100.";

/// Create a temporary directory holding the given `(relative path, contents)` files.
pub fn policy_dir(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    for (name, contents) in files {
        write_file(dir.path(), name, contents);
    }
    dir
}

pub fn write_file(root: &Path, name: &str, contents: &str) {
    let path = root.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create parent dir");
    }
    std::fs::write(path, contents).expect("Failed to write fixture");
}

/// Vector store over a fresh in-memory database.
pub async fn memory_store() -> Arc<SqliteVectorStore> {
    Arc::new(SqliteVectorStore::new(
        initialize_test_database().await.expect("Failed to create test database"),
    ))
}

/// Embeds text as a bag of lowercase words hashed into `dimension` buckets.
/// Texts sharing words get similar vectors.
pub struct HashEmbedder {
    dimension: usize,
    calls: AtomicUsize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vector(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0; self.dimension];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.len() > 2)
        {
            let bucket = word
                .to_lowercase()
                .bytes()
                .fold(5381usize, |h, b| h.wrapping_mul(33) ^ b as usize);
            v[bucket % self.dimension] += 1.0;
        }
        v
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    fn name(&self) -> &'static str {
        "hash"
    }

    fn model(&self) -> &str {
        "hash-embedder"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> DomainResult<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.vector(text))
    }

    async fn embed_batch(&self, inputs: &[EmbeddingInput]) -> DomainResult<Vec<EmbeddingOutput>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(inputs
            .iter()
            .map(|i| EmbeddingOutput {
                id: i.id.clone(),
                vector: self.vector(&i.text),
            })
            .collect())
    }

    fn max_batch_size(&self) -> usize {
        8
    }
}

/// Generation client that records prompts and answers with a fixed text,
/// after an optional delay.
pub struct RecordingGenerator {
    answer: String,
    delay: Option<Duration>,
    prompts: Mutex<Vec<String>>,
}

impl RecordingGenerator {
    pub fn answering(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            delay: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Sleeps for `delay` before answering; pair with a shorter stage timeout.
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::answering("late answer")
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationClient for RecordingGenerator {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn model(&self) -> &str {
        "recording-model"
    }

    async fn generate(&self, prompt: &str) -> DomainResult<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.answer.clone())
    }
}

/// Generation client whose every call fails like an overloaded API.
pub struct UnavailableGenerator;

#[async_trait]
impl GenerationClient for UnavailableGenerator {
    fn name(&self) -> &'static str {
        "unavailable"
    }

    fn model(&self) -> &str {
        "unavailable-model"
    }

    async fn generate(&self, _prompt: &str) -> DomainResult<String> {
        Err(DomainError::Provider {
            provider: "unavailable".to_string(),
            endpoint: "models/unavailable-model:generateContent".to_string(),
            status: Some(503),
            message: "The model is overloaded".to_string(),
            transient: true,
        })
    }
}

/// In-memory log sink usable as a `tracing_subscriber` writer.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Capture logs emitted on the current thread until the guard is dropped.
///
/// Use with the default current-thread `#[tokio::test]` runtime.
pub fn capture_logs() -> (LogBuffer, DefaultGuard) {
    let buffer = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buffer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (buffer, guard)
}
