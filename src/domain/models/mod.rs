pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod ingest;
pub mod query;

pub use chunking::{BoundaryKind, Chunk, ChunkMetadata, ChunkingConfig};
pub use config::{
    Config, DatabaseConfig, LoggingConfig, ProviderConfig, RagConfig, ServerConfig,
};
pub use document::RawDocument;
pub use embedding::{
    CollectionInfo, CollectionSpec, EmbeddedChunk, SearchResult, VectorStoreEntry, WriteMode,
};
pub use ingest::{IngestPolicy, IngestReport, IngestRequest};
pub use query::{QueryResult, QueryStage};
