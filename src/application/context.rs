//! Process-wide context: configuration, store, providers and services.
//!
//! Built once at startup and shared behind `Arc`s. Missing credentials fail
//! here, before any ingestion or query runs.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

use crate::adapters::gemini::{
    embedding::GeminiEmbeddingConfig, generation::GeminiGenerationConfig, GeminiConfig,
    GeminiEmbeddingProvider, GeminiGenerationClient, GeminiHttp,
};
use crate::adapters::sqlite::{connection::PoolConfig, initialize_database, SqliteVectorStore};
use crate::domain::errors::DomainResult;
use crate::domain::models::{ChunkingConfig, Config, IngestReport, IngestRequest};
use crate::domain::ports::{EmbeddingProvider, GenerationClient, VectorStore};
use crate::infrastructure::config::ConfigLoader;
use crate::services::{IngestionService, QueryService, Retriever};

pub struct RagContext {
    config: Config,
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn GenerationClient>,
    ingestion: Arc<IngestionService>,
    query: Arc<QueryService>,
}

impl RagContext {
    /// Validate `config`, open the vector store and build the Gemini clients.
    #[instrument(skip_all)]
    pub async fn initialize(config: Config) -> Result<Self> {
        ConfigLoader::validate(&config).context("Invalid configuration")?;
        let gemini = GeminiConfig::from_provider(&config.provider)?;

        let store = Self::open_vector_store(&config).await?;
        let http = Arc::new(GeminiHttp::new(gemini)?);
        let embedder = Arc::new(GeminiEmbeddingProvider::new(
            GeminiEmbeddingConfig::from(&config.provider),
            http.clone(),
        ));
        let generator = Arc::new(GeminiGenerationClient::new(
            GeminiGenerationConfig::from(&config.provider),
            http,
        ));

        Ok(Self::from_parts(
            config,
            Arc::new(store),
            embedder,
            generator,
        ))
    }

    /// Open (creating if needed) the vector store under `database.data_dir`.
    ///
    /// Needs no provider credentials, so store-only commands use it directly.
    pub async fn open_vector_store(config: &Config) -> Result<SqliteVectorStore> {
        let data_dir = &config.database.data_dir;
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;
        let db_path = config.database.database_path();
        let pool = initialize_database(
            &db_path,
            Some(PoolConfig::default().with_max_connections(config.database.max_connections)),
        )
        .await
        .with_context(|| format!("Failed to open vector store at {}", db_path.display()))?;
        info!(path = %db_path.display(), "Vector store ready");
        Ok(SqliteVectorStore::new(pool))
    }

    /// Assemble a context from already-built components.
    pub fn from_parts(
        config: Config,
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn GenerationClient>,
    ) -> Self {
        let timeout = Duration::from_secs(config.provider.request_timeout_secs);

        let ingestion = IngestionService::new(embedder.clone(), store.clone())
            .with_concurrency(config.rag.embedding_concurrency)
            .with_batch_timeout(timeout);
        let retriever = Arc::new(Retriever::new(embedder.clone(), store.clone()));
        let query = QueryService::new(retriever, generator.clone())
            .with_top_k(config.rag.top_k)
            .with_stage_timeout(timeout);

        Self {
            config,
            store,
            embedder,
            generator,
            ingestion: Arc::new(ingestion),
            query: Arc::new(query),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> Arc<dyn VectorStore> {
        self.store.clone()
    }

    pub fn embedder(&self) -> Arc<dyn EmbeddingProvider> {
        self.embedder.clone()
    }

    pub fn generator(&self) -> Arc<dyn GenerationClient> {
        self.generator.clone()
    }

    pub fn ingestion(&self) -> Arc<IngestionService> {
        self.ingestion.clone()
    }

    pub fn query(&self) -> Arc<QueryService> {
        self.query.clone()
    }

    /// Configured default collection.
    pub fn collection(&self) -> &str {
        &self.config.rag.collection_name
    }

    /// Ingestion request built from the `rag` section.
    pub fn ingest_request(&self) -> IngestRequest {
        let rag = &self.config.rag;
        IngestRequest::new(&rag.source_dir, &rag.collection_name)
            .with_chunking(ChunkingConfig::new(rag.chunk_size, rag.chunk_overlap))
            .with_policy(rag.ingest_policy)
            .with_extensions(rag.extensions.clone())
    }

    /// Run the configured ingestion if `rag.ingest_on_startup` is set.
    pub async fn ingest_on_startup(&self) -> DomainResult<Option<IngestReport>> {
        if !self.config.rag.ingest_on_startup {
            return Ok(None);
        }
        self.ingestion.ingest(&self.ingest_request()).await.map(Some)
    }
}
