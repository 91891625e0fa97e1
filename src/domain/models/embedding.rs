//! Embedding and vector store domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::chunking::Chunk;

/// A chunk together with its embedding vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedChunk {
    pub chunk: Chunk,

    /// Embedding vector; its length must equal the collection dimension.
    pub vector: Vec<f32>,
}

impl EmbeddedChunk {
    pub fn new(chunk: Chunk, vector: Vec<f32>) -> Self {
        Self { chunk, vector }
    }

    pub fn dimension(&self) -> usize {
        self.vector.len()
    }
}

/// Identity of a collection: the embedding model and dimension its vectors were built with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSpec {
    pub name: String,
    pub embedding_model: String,
    pub dimension: usize,
}

impl CollectionSpec {
    pub fn new(name: impl Into<String>, embedding_model: impl Into<String>, dimension: usize) -> Self {
        Self {
            name: name.into(),
            embedding_model: embedding_model.into(),
            dimension,
        }
    }
}

/// A stored collection with its entry count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub name: String,
    pub embedding_model: String,
    pub dimension: usize,
    pub entry_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CollectionInfo {
    pub fn is_empty(&self) -> bool {
        self.entry_count == 0
    }
}

/// How a write treats entries already in the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Keep existing entries and add the new ones after them.
    Append,
    /// Delete existing entries; the new ones take their place atomically.
    Replace,
}

/// A persisted entry as returned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorStoreEntry {
    pub id: Uuid,
    pub collection: String,
    pub chunk: Chunk,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub vector: Vec<f32>,
    pub created_at: DateTime<Utc>,
}

/// Search result from similarity search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Entry identifier
    pub id: Uuid,

    /// The matched chunk
    pub chunk: Chunk,

    /// Cosine distance to the query (0 = identical direction, 2 = opposite)
    pub distance: f32,
}

impl SearchResult {
    pub fn new(id: Uuid, chunk: Chunk, distance: f32) -> Self {
        Self { id, chunk, distance }
    }

    /// Cosine similarity (1 - distance)
    pub fn similarity(&self) -> f32 {
        1.0 - self.distance
    }
}
