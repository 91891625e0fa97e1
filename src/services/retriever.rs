//! Top-K retrieval over a collection.

use std::sync::Arc;

use tracing::debug;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Chunk, CollectionInfo, SearchResult};
use crate::domain::ports::{EmbeddingProvider, VectorStore};

pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }

    /// The `k` chunks most similar to `query`, most similar first.
    ///
    /// An unknown or empty collection yields an empty vector without calling
    /// the embedding provider.
    pub async fn retrieve(&self, query: &str, collection: &str, k: usize) -> DomainResult<Vec<Chunk>> {
        Ok(self
            .retrieve_scored(query, collection, k)
            .await?
            .into_iter()
            .map(|r| r.chunk)
            .collect())
    }

    /// Like [`Retriever::retrieve`] with distances.
    pub async fn retrieve_scored(
        &self,
        query: &str,
        collection: &str,
        k: usize,
    ) -> DomainResult<Vec<SearchResult>> {
        Self::check_k(k)?;
        if self.searchable_collection(collection).await?.is_none() {
            return Ok(Vec::new());
        }

        let vector = self.embed_query(query).await?;
        self.search(collection, &vector, k).await
    }

    pub(crate) fn check_k(k: usize) -> DomainResult<()> {
        if k == 0 {
            return Err(DomainError::InvalidArgument("k must be at least 1".to_string()));
        }
        Ok(())
    }

    /// The collection if it holds entries compatible with the configured
    /// embedding model, `None` if it is unknown or empty.
    pub async fn searchable_collection(&self, collection: &str) -> DomainResult<Option<CollectionInfo>> {
        let Some(info) = self.store.collection(collection).await? else {
            debug!(collection, "Collection not found");
            return Ok(None);
        };
        if info.is_empty() {
            debug!(collection, "Collection is empty");
            return Ok(None);
        }

        if info.embedding_model != self.embedder.model() {
            return Err(DomainError::EmbeddingModelMismatch {
                collection: collection.to_string(),
                stored: info.embedding_model,
                configured: self.embedder.model().to_string(),
            });
        }
        if info.dimension != self.embedder.dimension() {
            return Err(DomainError::DimensionMismatch {
                context: format!("collection '{collection}'"),
                expected: info.dimension,
                actual: self.embedder.dimension(),
            });
        }
        Ok(Some(info))
    }

    pub async fn embed_query(&self, query: &str) -> DomainResult<Vec<f32>> {
        self.embedder.embed(query).await
    }

    pub async fn search(&self, collection: &str, vector: &[f32], k: usize) -> DomainResult<Vec<SearchResult>> {
        let results = self.store.search(collection, vector, k).await?;
        debug!(collection, k, found = results.len(), "Retrieved chunks");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{CollectionSpec, WriteMode};
    use crate::services::test_support::{embedded, memory_store, FixedEmbedder};

    #[tokio::test]
    async fn test_returns_closest_chunk() {
        let store = memory_store().await;
        let embedder = Arc::new(FixedEmbedder::new(3).with("query about B", vec![0.1, 0.9, 0.0]));
        store
            .write(
                &CollectionSpec::new("c", embedder.model(), 3),
                &[
                    embedded("A", vec![1.0, 0.0, 0.0]),
                    embedded("B", vec![0.0, 1.0, 0.0]),
                    embedded("C", vec![0.0, 0.0, 1.0]),
                ],
                WriteMode::Append,
            )
            .await
            .unwrap();

        let retriever = Retriever::new(embedder, store);
        let chunks = retriever.retrieve("query about B", "c", 1).await.unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "B");

        let all = retriever.retrieve("query about B", "c", 10).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_empty_collection_skips_embedding() {
        let embedder = Arc::new(FixedEmbedder::new(3));
        let retriever = Retriever::new(embedder.clone(), memory_store().await);

        assert!(retriever.retrieve("anything", "empty", 4).await.unwrap().is_empty());
        assert_eq!(embedder.calls(), 0);
    }

    #[tokio::test]
    async fn test_zero_k_is_invalid() {
        let retriever = Retriever::new(Arc::new(FixedEmbedder::new(3)), memory_store().await);
        let err = retriever.retrieve("q", "c", 0).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_model_mismatch_is_refused() {
        let store = memory_store().await;
        store
            .write(
                &CollectionSpec::new("c", "older-model", 3),
                &[embedded("A", vec![1.0, 0.0, 0.0])],
                WriteMode::Append,
            )
            .await
            .unwrap();

        let retriever = Retriever::new(Arc::new(FixedEmbedder::new(3)), store);
        let err = retriever.retrieve("q", "c", 4).await.unwrap_err();
        assert!(matches!(err, DomainError::EmbeddingModelMismatch { .. }));
        assert!(err.is_configuration());
    }
}
