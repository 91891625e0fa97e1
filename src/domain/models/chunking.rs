//! Text chunking domain models
//!
//! Models for splitting policy documents into overlapping chunks for embedding.
//! All sizes and offsets are measured in characters (Unicode scalar values).

use serde::{Deserialize, Serialize};

/// Configuration for document chunking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum size of each chunk in characters
    pub chunk_size: usize,

    /// Number of trailing characters of a chunk repeated at the start of the next one
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    /// 512 characters per chunk with a 50 character overlap.
    fn default() -> Self {
        Self {
            chunk_size: 512,
            chunk_overlap: 50,
        }
    }
}

impl ChunkingConfig {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    /// Validate the chunking configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("chunk_size must be greater than 0".to_string());
        }

        if self.chunk_overlap >= self.chunk_size {
            return Err(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            ));
        }

        Ok(())
    }
}

/// Where a chunk ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryKind {
    /// After a blank line.
    Paragraph,
    /// After a single line break.
    Line,
    /// After sentence punctuation followed by whitespace.
    Sentence,
    /// No boundary in the window; cut at `chunk_size`.
    Hard,
    /// Last chunk of the document.
    EndOfDocument,
}

/// Metadata about a chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Source document path, relative to the loader root
    pub source_path: String,

    /// Start position in the original document (character offset)
    pub start_offset: usize,

    /// End position in the original document (character offset, exclusive)
    pub end_offset: usize,

    /// How the chunk was terminated
    pub boundary: BoundaryKind,
}

impl ChunkMetadata {
    pub fn new(
        source_path: impl Into<String>,
        start_offset: usize,
        end_offset: usize,
        boundary: BoundaryKind,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            start_offset,
            end_offset,
            boundary,
        }
    }
}

/// A bounded slice of a source document; the unit of embedding and retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// The text content of this chunk
    pub text: String,

    /// Source metadata
    pub metadata: ChunkMetadata,

    /// Index of this chunk within its document (0-based)
    pub sequence_index: usize,
}

impl Chunk {
    pub fn new(text: String, metadata: ChunkMetadata, sequence_index: usize) -> Self {
        Self {
            text,
            metadata,
            sequence_index,
        }
    }

    /// Returns true if this is the first chunk of its document
    pub fn is_first(&self) -> bool {
        self.sequence_index == 0
    }

    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn source_path(&self) -> &str {
        &self.metadata.source_path
    }

    /// Get a preview of the content (first 100 chars)
    pub fn preview(&self) -> String {
        if self.char_len() <= 100 {
            self.text.clone()
        } else {
            let head: String = self.text.chars().take(100).collect();
            format!("{head}...")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunking_config_default() {
        let config = ChunkingConfig::default();
        assert_eq!(config.chunk_size, 512);
        assert_eq!(config.chunk_overlap, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_chunking_config_validation() {
        assert!(ChunkingConfig::new(0, 0).validate().is_err());
        assert!(ChunkingConfig::new(100, 100).validate().is_err());
        assert!(ChunkingConfig::new(100, 150).validate().is_err());
        assert!(ChunkingConfig::new(100, 0).validate().is_ok());
        assert!(ChunkingConfig::new(1, 0).validate().is_ok());
    }

    #[test]
    fn test_chunk_preview_counts_characters() {
        let meta = ChunkMetadata::new("a.txt", 0, 5, BoundaryKind::EndOfDocument);
        let short = Chunk::new("short".to_string(), meta.clone(), 0);
        assert_eq!(short.preview(), "short");
        assert!(short.is_first());

        let long = Chunk::new("é".repeat(200), meta, 1);
        assert_eq!(long.preview().chars().count(), 103);
        assert!(!long.is_first());
    }
}
