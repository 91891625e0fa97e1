//! Ingestion pipeline: load, chunk, embed, store.

use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::OwnedMutexGuard;
use tracing::{error, info, instrument, warn};

use super::chunker::Chunker;
use super::document_loader::DocumentLoader;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    Chunk, CollectionInfo, CollectionSpec, EmbeddedChunk, IngestPolicy, IngestReport, IngestRequest,
    WriteMode,
};
use crate::domain::ports::{EmbeddingInput, EmbeddingProvider, VectorStore};

const DEFAULT_CONCURRENCY: usize = 4;
const DEFAULT_BATCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs ingestion. At most one run per collection is active at a time;
/// searches are never blocked.
pub struct IngestionService {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    locks: LockMap,
    concurrency: usize,
    batch_timeout: Duration,
}

type LockMap = Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>;

/// Holds a collection's ingestion lock. On drop the map entry is removed once
/// no other task is waiting for it.
struct CollectionGuard<'a> {
    locks: &'a LockMap,
    collection: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for CollectionGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks
            .get(&self.collection)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.collection);
        }
    }
}

/// Chunks of one run plus the loader's skip count.
struct Prepared {
    chunks: Vec<Chunk>,
    documents_loaded: usize,
    documents_skipped: usize,
}

impl IngestionService {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, store: Arc<dyn VectorStore>) -> Self {
        Self {
            embedder,
            store,
            locks: Mutex::new(HashMap::new()),
            concurrency: DEFAULT_CONCURRENCY,
            batch_timeout: DEFAULT_BATCH_TIMEOUT,
        }
    }

    /// Embedding batches in flight at once.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Upper bound for a single embedding batch request.
    pub fn with_batch_timeout(mut self, timeout: Duration) -> Self {
        self.batch_timeout = timeout;
        self
    }

    async fn lock_collection(&self, collection: &str) -> CollectionGuard<'_> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry(collection.to_string()).or_default().clone()
        };
        let mut held = CollectionGuard {
            locks: &self.locks,
            collection: collection.to_string(),
            guard: None,
        };
        held.guard = Some(lock.lock_owned().await);
        held
    }

    /// The stored collection must have been built with the configured model and dimension.
    fn check_compatible(&self, info: &CollectionInfo) -> DomainResult<()> {
        if info.embedding_model != self.embedder.model() {
            return Err(DomainError::EmbeddingModelMismatch {
                collection: info.name.clone(),
                stored: info.embedding_model.clone(),
                configured: self.embedder.model().to_string(),
            });
        }
        if info.dimension != self.embedder.dimension() {
            return Err(DomainError::DimensionMismatch {
                context: format!("collection '{}'", info.name),
                expected: info.dimension,
                actual: self.embedder.dimension(),
            });
        }
        Ok(())
    }

    /// Ingest `request.source_dir` into `request.collection`.
    #[instrument(skip(self, request), fields(collection = %request.collection, policy = %request.policy))]
    pub async fn ingest(&self, request: &IngestRequest) -> DomainResult<IngestReport> {
        if request.collection.trim().is_empty() {
            return Err(DomainError::InvalidArgument("collection name cannot be empty".to_string()));
        }
        let chunker = Chunker::with_config(request.chunking)?;

        let _guard = self.lock_collection(&request.collection).await;

        let mut report = IngestReport {
            collection: request.collection.clone(),
            policy: request.policy,
            ..IngestReport::default()
        };

        let existing = self.store.collection(&request.collection).await?;
        let existing_entries = existing.as_ref().map_or(0, |c| c.entry_count);
        if request.policy != IngestPolicy::Replace {
            if let Some(info) = existing.as_ref().filter(|c| !c.is_empty()) {
                self.check_compatible(info)?;
            }
        }
        let mode = match request.policy {
            IngestPolicy::SkipIfPresent if existing_entries > 0 => {
                info!(entries = existing_entries, "Collection already populated, skipping ingestion");
                report.skipped_existing = true;
                return Ok(report);
            }
            IngestPolicy::SkipIfPresent | IngestPolicy::Replace => WriteMode::Replace,
            IngestPolicy::Append => WriteMode::Append,
        };

        let prepared = Self::prepare(request, chunker).await?;
        report.documents_loaded = prepared.documents_loaded;
        report.documents_skipped = prepared.documents_skipped;

        if prepared.chunks.is_empty() && mode == WriteMode::Append {
            warn!(source = %request.source_dir.display(), "No chunks produced; nothing to append");
            return Ok(report);
        }
        if prepared.chunks.is_empty() {
            warn!(source = %request.source_dir.display(), "No documents found in source directory");
        }

        let chunk_count = prepared.chunks.len();
        let embedded = match self.embed_chunks(prepared.chunks).await {
            Ok(embedded) => embedded,
            Err(e) => {
                error!(
                    error = %e,
                    chunks = chunk_count,
                    entries_written = 0,
                    "Ingestion aborted while embedding; the collection may not reflect the source \
                     documents. Reset the collection and re-run ingestion"
                );
                return Err(e);
            }
        };

        let spec = CollectionSpec::new(
            request.collection.clone(),
            self.embedder.model(),
            self.embedder.dimension(),
        );
        report.chunks_stored = match self.store.write(&spec, &embedded, mode).await {
            Ok(written) => written,
            Err(e) => {
                error!(
                    error = %e,
                    chunks = embedded.len(),
                    entries_written = 0,
                    "Ingestion aborted while writing to the vector store; the transaction was rolled \
                     back. Reset the collection and re-run ingestion"
                );
                return Err(e);
            }
        };
        if mode == WriteMode::Replace {
            report.entries_replaced = existing_entries;
        }

        info!(
            documents = report.documents_loaded,
            skipped_documents = report.documents_skipped,
            chunks = report.chunks_stored,
            replaced = report.entries_replaced,
            "Ingestion complete"
        );
        Ok(report)
    }

    /// Load and chunk on the blocking pool; the loader reads files synchronously.
    async fn prepare(request: &IngestRequest, chunker: Chunker) -> DomainResult<Prepared> {
        let loader = DocumentLoader::new(&request.source_dir, &request.extensions);

        tokio::task::spawn_blocking(move || -> DomainResult<Prepared> {
            let mut documents = loader.load()?;
            let mut chunks = Vec::new();
            let mut documents_loaded = 0;
            for document in documents.by_ref() {
                documents_loaded += 1;
                chunks.extend(chunker.chunk(&document));
            }
            Ok(Prepared {
                chunks,
                documents_loaded,
                documents_skipped: documents.skipped(),
            })
        })
        .await
        .map_err(|e| DomainError::TaskFailed(format!("document loading: {e}")))?
    }

    /// Embed in batches with bounded concurrency. Output order matches input order.
    async fn embed_chunks(&self, chunks: Vec<Chunk>) -> DomainResult<Vec<EmbeddedChunk>> {
        let batch_size = self.embedder.max_batch_size().max(1);
        let dimension = self.embedder.dimension();
        let timeout_ms = u64::try_from(self.batch_timeout.as_millis()).unwrap_or(u64::MAX);

        let batches: Vec<Vec<Chunk>> = chunks.chunks(batch_size).map(<[Chunk]>::to_vec).collect();

        let embedded: Vec<Vec<EmbeddedChunk>> = stream::iter(batches)
            .map(|batch| async move {
                let inputs: Vec<EmbeddingInput> = batch
                    .iter()
                    .map(|c| {
                        EmbeddingInput::new(format!("{}#{}", c.source_path(), c.sequence_index), c.text.clone())
                    })
                    .collect();

                let outputs = tokio::time::timeout(self.batch_timeout, self.embedder.embed_batch(&inputs))
                    .await
                    .map_err(|_| DomainError::Timeout {
                        stage: "embedding_documents".to_string(),
                        after_ms: timeout_ms,
                    })??;

                if outputs.len() != batch.len() {
                    return Err(DomainError::Provider {
                        provider: self.embedder.name().to_string(),
                        endpoint: "embed_batch".to_string(),
                        status: None,
                        message: format!("expected {} embeddings, got {}", batch.len(), outputs.len()),
                        transient: false,
                    });
                }

                batch
                    .into_iter()
                    .zip(outputs)
                    .map(|(chunk, output)| {
                        if output.vector.len() == dimension {
                            Ok(EmbeddedChunk::new(chunk, output.vector))
                        } else {
                            Err(DomainError::DimensionMismatch {
                                context: format!("embedding for {}", output.id),
                                expected: dimension,
                                actual: output.vector.len(),
                            })
                        }
                    })
                    .collect::<DomainResult<Vec<_>>>()
            })
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        Ok(embedded.into_iter().flatten().collect())
    }

    /// Delete a collection and all of its entries.
    #[instrument(skip(self))]
    pub async fn reset(&self, collection: &str) -> DomainResult<usize> {
        let _guard = self.lock_collection(collection).await;

        let removed = self.store.delete_collection(collection).await?;
        info!(removed, "Collection reset");
        Ok(removed)
    }
}
