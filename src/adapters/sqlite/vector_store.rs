//! SQLite-backed vector store.
//!
//! Embeddings are stored as little-endian f32 BLOBs and ranked in Rust with
//! cosine distance. Rows are scanned in `seq` order and sorted stably, so equal
//! distances keep insertion order.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{parse_datetime, parse_uuid};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    Chunk, ChunkMetadata, CollectionInfo, CollectionSpec, EmbeddedChunk, SearchResult, WriteMode,
};
use crate::domain::ports::VectorStore;

const COLLECTION_COLUMNS: &str = "c.name, c.embedding_model, c.dimension, c.created_at, c.updated_at, \
     (SELECT COUNT(*) FROM chunk_entries e WHERE e.collection = c.name) AS entry_count";

/// Vector store over the `collections` and `chunk_entries` tables.
#[derive(Clone)]
pub struct SqliteVectorStore {
    pool: SqlitePool,
}

impl SqliteVectorStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn row_to_collection(row: &sqlx::sqlite::SqliteRow) -> DomainResult<CollectionInfo> {
        let dimension: i64 = row.try_get("dimension")?;
        let entry_count: i64 = row.try_get("entry_count")?;
        let created_at: String = row.try_get("created_at")?;
        let updated_at: String = row.try_get("updated_at")?;

        Ok(CollectionInfo {
            name: row.try_get("name")?,
            embedding_model: row.try_get("embedding_model")?,
            dimension: usize::try_from(dimension).unwrap_or_default(),
            entry_count: usize::try_from(entry_count).unwrap_or_default(),
            created_at: parse_datetime(&created_at)?,
            updated_at: parse_datetime(&updated_at)?,
        })
    }

    fn row_to_chunk(row: &sqlx::sqlite::SqliteRow) -> DomainResult<Chunk> {
        let metadata: String = row.try_get("metadata")?;
        let metadata: ChunkMetadata = serde_json::from_str(&metadata)?;
        let sequence_index: i64 = row.try_get("sequence_index")?;

        Ok(Chunk::new(
            row.try_get("content")?,
            metadata,
            usize::try_from(sequence_index).unwrap_or_default(),
        ))
    }
}

/// Serialize embedding vector to bytes
pub fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Deserialize embedding vector from bytes
pub fn bytes_to_embedding(bytes: &[u8]) -> DomainResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(DomainError::SerializationError(format!(
            "Invalid embedding bytes length: {}",
            bytes.len()
        )));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

/// Cosine distance (`1 - cosine similarity`). Mismatched lengths and zero
/// vectors rank last.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return f32::MAX;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return f32::MAX;
    }

    1.0 - (dot / (mag_a * mag_b))
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    async fn collection(&self, name: &str) -> DomainResult<Option<CollectionInfo>> {
        let sql = format!("SELECT {COLLECTION_COLUMNS} FROM collections c WHERE c.name = ?");
        let row = sqlx::query(&sql).bind(name).fetch_optional(&self.pool).await?;
        row.as_ref().map(Self::row_to_collection).transpose()
    }

    async fn list_collections(&self) -> DomainResult<Vec<CollectionInfo>> {
        let sql = format!("SELECT {COLLECTION_COLUMNS} FROM collections c ORDER BY c.name");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(Self::row_to_collection).collect()
    }

    async fn count(&self, collection: &str) -> DomainResult<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunk_entries WHERE collection = ?")
            .bind(collection)
            .fetch_one(&self.pool)
            .await?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    async fn write(
        &self,
        spec: &CollectionSpec,
        entries: &[EmbeddedChunk],
        mode: WriteMode,
    ) -> DomainResult<usize> {
        if spec.dimension == 0 {
            return Err(DomainError::InvalidArgument(
                "collection dimension must be greater than 0".to_string(),
            ));
        }
        if let Some(bad) = entries.iter().find(|e| e.dimension() != spec.dimension) {
            return Err(DomainError::DimensionMismatch {
                context: format!(
                    "chunk {} of {}",
                    bad.chunk.sequence_index,
                    bad.chunk.source_path()
                ),
                expected: spec.dimension,
                actual: bad.dimension(),
            });
        }

        let now = Utc::now().to_rfc3339();
        let dimension = i64::try_from(spec.dimension)
            .map_err(|_| DomainError::InvalidArgument("dimension out of range".to_string()))?;
        let mut tx = self.pool.begin().await?;

        let existing: Option<(String, i64)> =
            sqlx::query_as("SELECT embedding_model, dimension FROM collections WHERE name = ?")
                .bind(&spec.name)
                .fetch_optional(&mut *tx)
                .await?;

        match (existing, mode) {
            (None, _) => {
                sqlx::query(
                    "INSERT INTO collections (name, embedding_model, dimension, created_at, updated_at)
                     VALUES (?, ?, ?, ?, ?)",
                )
                .bind(&spec.name)
                .bind(&spec.embedding_model)
                .bind(dimension)
                .bind(&now)
                .bind(&now)
                .execute(&mut *tx)
                .await?;
            }
            (Some((stored_model, stored_dimension)), WriteMode::Append) => {
                if stored_model != spec.embedding_model {
                    return Err(DomainError::EmbeddingModelMismatch {
                        collection: spec.name.clone(),
                        stored: stored_model,
                        configured: spec.embedding_model.clone(),
                    });
                }
                if stored_dimension != dimension {
                    return Err(DomainError::DimensionMismatch {
                        context: format!("collection '{}'", spec.name),
                        expected: usize::try_from(stored_dimension).unwrap_or_default(),
                        actual: spec.dimension,
                    });
                }
                sqlx::query("UPDATE collections SET updated_at = ? WHERE name = ?")
                    .bind(&now)
                    .bind(&spec.name)
                    .execute(&mut *tx)
                    .await?;
            }
            (Some(_), WriteMode::Replace) => {
                let removed = sqlx::query("DELETE FROM chunk_entries WHERE collection = ?")
                    .bind(&spec.name)
                    .execute(&mut *tx)
                    .await?
                    .rows_affected();
                sqlx::query(
                    "UPDATE collections SET embedding_model = ?, dimension = ?, updated_at = ? WHERE name = ?",
                )
                .bind(&spec.embedding_model)
                .bind(dimension)
                .bind(&now)
                .bind(&spec.name)
                .execute(&mut *tx)
                .await?;
                tracing::debug!(collection = %spec.name, removed, "Cleared collection for replacement");
            }
        }

        for entry in entries {
            let metadata = serde_json::to_string(&entry.chunk.metadata)?;
            let sequence_index = i64::try_from(entry.chunk.sequence_index).unwrap_or(i64::MAX);
            sqlx::query(
                "INSERT INTO chunk_entries
                     (id, collection, source_path, sequence_index, content, metadata, embedding, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&spec.name)
            .bind(entry.chunk.source_path())
            .bind(sequence_index)
            .bind(&entry.chunk.text)
            .bind(metadata)
            .bind(embedding_to_bytes(&entry.vector))
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::debug!(
            collection = %spec.name,
            written = entries.len(),
            ?mode,
            "Stored embedded chunks"
        );
        Ok(entries.len())
    }

    async fn search(
        &self,
        collection: &str,
        query: &[f32],
        limit: usize,
    ) -> DomainResult<Vec<SearchResult>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let Some(info) = self.collection(collection).await? else {
            return Ok(Vec::new());
        };
        if query.len() != info.dimension {
            return Err(DomainError::DimensionMismatch {
                context: format!("query against collection '{collection}'"),
                expected: info.dimension,
                actual: query.len(),
            });
        }

        let rows = sqlx::query(
            "SELECT id, sequence_index, content, metadata, embedding
             FROM chunk_entries WHERE collection = ? ORDER BY seq",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;

        let mut results = Vec::with_capacity(rows.len());
        for row in &rows {
            let id: String = row.try_get("id")?;
            let embedding: Vec<u8> = row.try_get("embedding")?;
            let vector = bytes_to_embedding(&embedding)?;
            results.push(SearchResult::new(
                parse_uuid(&id)?,
                Self::row_to_chunk(row)?,
                cosine_distance(query, &vector),
            ));
        }

        // Stable: equal distances stay in seq order.
        results.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        results.truncate(limit);
        Ok(results)
    }

    async fn delete_collection(&self, name: &str) -> DomainResult<usize> {
        let mut tx = self.pool.begin().await?;
        let removed = sqlx::query("DELETE FROM chunk_entries WHERE collection = ?")
            .bind(name)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        sqlx::query("DELETE FROM collections WHERE name = ?")
            .bind(name)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(usize::try_from(removed).unwrap_or(usize::MAX))
    }
}
