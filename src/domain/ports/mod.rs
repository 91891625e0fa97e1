//! Port trait definitions (Hexagonal Architecture)
//!
//! - EmbeddingProvider: hosted text embedding API
//! - GenerationClient: hosted generative model
//! - VectorStore: persisted chunk vectors with similarity search

pub mod embedding;
pub mod generation;
pub mod vector_store;

pub use embedding::{EmbeddingInput, EmbeddingOutput, EmbeddingProvider};
pub use generation::GenerationClient;
pub use vector_store::VectorStore;
