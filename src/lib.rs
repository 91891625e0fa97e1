//! Policy RAG - retrieval-augmented assistant for bus provider policies
//!
//! Answers customer questions about bus providers (refund rules, baggage,
//! contact details) from plain-text policy documents: documents are chunked,
//! embedded and stored in a SQLite vector store; questions are embedded,
//! matched against the store and answered by a generative model that is told
//! to use only the retrieved context.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Models, errors and port traits
//! - **Service Layer** (`services`): Loader, chunker, ingestion and query pipelines
//! - **Adapters** (`adapters`): Gemini REST clients, SQLite vector store, HTTP API
//! - **Application Layer** (`application`): Startup wiring shared by CLI and server
//! - **Infrastructure Layer** (`infrastructure`): Configuration and logging
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use policy_rag::{ConfigLoader, RagContext};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let context = RagContext::initialize(ConfigLoader::load(None)?).await?;
//!     context.ingest_on_startup().await?;
//!     let answer = context
//!         .query()
//!         .answer("How long do refunds take?", context.collection())
//!         .await;
//!     println!("{answer}");
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use application::RagContext;
pub use domain::errors::{DomainError, DomainResult, ErrorKind};
pub use domain::models::{
    Chunk, ChunkingConfig, CollectionInfo, Config, IngestPolicy, IngestReport, IngestRequest,
    QueryResult, RawDocument, SearchResult,
};
pub use domain::ports::{EmbeddingProvider, GenerationClient, VectorStore};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{Chunker, DocumentLoader, IngestionService, PromptAssembler, QueryService, Retriever};
