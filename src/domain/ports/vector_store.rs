//! Vector store port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{CollectionInfo, CollectionSpec, EmbeddedChunk, SearchResult, WriteMode};

/// Persistent, collection-partitioned store of embedded chunks.
///
/// The ingestion pipeline is the only writer. Readers must observe either the
/// state before or after a `write`, never a partial one.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Look up a collection, `None` if it was never written.
    async fn collection(&self, name: &str) -> DomainResult<Option<CollectionInfo>>;

    /// All collections, ordered by name.
    async fn list_collections(&self) -> DomainResult<Vec<CollectionInfo>>;

    /// Number of entries in a collection (0 for unknown collections).
    async fn count(&self, collection: &str) -> DomainResult<usize>;

    /// Write entries in one transaction, creating the collection if needed.
    ///
    /// Every vector must have `spec.dimension` elements. With
    /// [`WriteMode::Replace`] existing entries are removed and the collection
    /// adopts `spec`'s model and dimension. Returns the number of entries written.
    async fn write(
        &self,
        spec: &CollectionSpec,
        entries: &[EmbeddedChunk],
        mode: WriteMode,
    ) -> DomainResult<usize>;

    /// The `limit` entries nearest to `query` by cosine distance, ascending.
    /// Ties keep insertion order.
    async fn search(
        &self,
        collection: &str,
        query: &[f32],
        limit: usize,
    ) -> DomainResult<Vec<SearchResult>>;

    /// Delete a collection and its entries. Returns the number of entries removed.
    async fn delete_collection(&self, name: &str) -> DomainResult<usize>;
}
