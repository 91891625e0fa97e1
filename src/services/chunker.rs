//! Text chunking
//!
//! Splits documents into overlapping chunks of at most `chunk_size`
//! characters. Inside each window the chunker cuts after the last paragraph
//! break, else the last line break, else the last sentence end, else at the
//! window edge. A cut is only accepted past the overlap so every step makes
//! progress.

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{BoundaryKind, Chunk, ChunkMetadata, ChunkingConfig, RawDocument};

/// Character-based chunker with boundary preference.
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    config: ChunkingConfig,
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            config: ChunkingConfig::default(),
        }
    }
}

impl Chunker {
    /// Create a new chunker with custom configuration
    pub fn with_config(config: ChunkingConfig) -> DomainResult<Self> {
        config
            .validate()
            .map_err(|e| DomainError::InvalidArgument(format!("Invalid chunking config: {e}")))?;
        Ok(Self { config })
    }

    pub fn config(&self) -> ChunkingConfig {
        self.config
    }

    /// Chunk a document. Empty or whitespace-only documents produce no chunks.
    pub fn chunk(&self, document: &RawDocument) -> Vec<Chunk> {
        if document.text.trim().is_empty() {
            return Vec::new();
        }

        let chars: Vec<char> = document.text.chars().collect();
        let size = self.config.chunk_size;
        let overlap = self.config.chunk_overlap;
        let mut chunks = Vec::new();
        let mut start = 0;

        loop {
            let window_end = (start + size).min(chars.len());
            let (end, boundary) = if window_end == chars.len() {
                (window_end, BoundaryKind::EndOfDocument)
            } else {
                Self::find_break(&chars, start + overlap + 1, window_end)
            };

            let text: String = chars[start..end].iter().collect();
            let metadata = ChunkMetadata::new(document.source_path.clone(), start, end, boundary);
            chunks.push(Chunk::new(text, metadata, chunks.len()));

            if boundary == BoundaryKind::EndOfDocument {
                break;
            }
            start = end - overlap;
        }

        chunks
    }

    /// Best cut position in `[min_end, window_end]`.
    fn find_break(chars: &[char], min_end: usize, window_end: usize) -> (usize, BoundaryKind) {
        let candidates = || (min_end..=window_end).rev();

        if let Some(end) = candidates().find(|&e| e >= 2 && chars[e - 2] == '\n' && chars[e - 1] == '\n') {
            return (end, BoundaryKind::Paragraph);
        }
        if let Some(end) = candidates().find(|&e| chars[e - 1] == '\n') {
            return (end, BoundaryKind::Line);
        }
        if let Some(end) = candidates()
            .find(|&e| e >= 2 && chars[e - 1].is_whitespace() && matches!(chars[e - 2], '.' | '!' | '?'))
        {
            return (end, BoundaryKind::Sentence);
        }
        (window_end, BoundaryKind::Hard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn doc(text: &str) -> RawDocument {
        RawDocument::new(text, "policy.txt")
    }

    fn chunker(size: usize, overlap: usize) -> Chunker {
        Chunker::with_config(ChunkingConfig::new(size, overlap)).unwrap()
    }

    fn reconstruct(chunks: &[Chunk], overlap: usize) -> String {
        let mut out = String::new();
        for (i, chunk) in chunks.iter().enumerate() {
            if i == 0 {
                out.push_str(&chunk.text);
            } else {
                out.extend(chunk.text.chars().skip(overlap));
            }
        }
        out
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(Chunker::with_config(ChunkingConfig::new(10, 10)).is_err());
        assert!(Chunker::with_config(ChunkingConfig::new(0, 0)).is_err());
    }

    #[test]
    fn test_empty_and_whitespace_documents() {
        let chunker = Chunker::default();
        assert!(chunker.chunk(&doc("")).is_empty());
        assert!(chunker.chunk(&doc("  \n\n\t ")).is_empty());
    }

    #[test]
    fn test_short_document_is_single_chunk() {
        let text = "Refunds are processed within 14 days. Contact support at 555-0100.";
        let chunks = Chunker::default().chunk(&doc(text));

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, text);
        assert_eq!(chunks[0].metadata.boundary, BoundaryKind::EndOfDocument);
        assert_eq!(chunks[0].metadata.start_offset, 0);
        assert_eq!(chunks[0].metadata.end_offset, text.chars().count());
        assert_eq!(chunks[0].source_path(), "policy.txt");
    }

    #[test]
    fn test_prefers_paragraph_break() {
        let text = "Luggage policy.\n\nEach passenger may carry 20kg. Extra bags cost more.";
        let chunks = chunker(40, 5).chunk(&doc(text));

        assert_eq!(chunks[0].text, "Luggage policy.\n\n");
        assert_eq!(chunks[0].metadata.boundary, BoundaryKind::Paragraph);
        assert_eq!(reconstruct(&chunks, 5), text);
    }

    #[test]
    fn test_falls_back_to_sentence_then_hard() {
        let text = "One sentence here. Another sentence follows it closely";
        let chunks = chunker(30, 0).chunk(&doc(text));
        assert_eq!(chunks[0].text, "One sentence here. ");
        assert_eq!(chunks[0].metadata.boundary, BoundaryKind::Sentence);

        let text = "abcdefghijklmnopqrstuvwxyz";
        let chunks = chunker(10, 3).chunk(&doc(text));
        assert_eq!(chunks[0].text, "abcdefghij");
        assert_eq!(chunks[0].metadata.boundary, BoundaryKind::Hard);
        assert_eq!(chunks[1].text, "hijklmnopq");
        assert_eq!(reconstruct(&chunks, 3), text);
    }

    #[test]
    fn test_boundary_inside_overlap_is_ignored() {
        // The only newline sits within the overlap region, so the cut is hard.
        let text = "a\nbcdefghijklmnop";
        let chunks = chunker(8, 4).chunk(&doc(text));
        assert_eq!(chunks[0].metadata.boundary, BoundaryKind::Hard);
        assert_eq!(chunks[0].char_len(), 8);
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        let text = "é".repeat(25);
        let chunks = chunker(10, 2).chunk(&doc(&text));
        assert!(chunks.iter().all(|c| c.char_len() <= 10));
        assert_eq!(chunks[0].char_len(), 10);
        assert_eq!(reconstruct(&chunks, 2), text);
    }

    #[test]
    fn test_sequence_indices_and_offsets() {
        let text = "x".repeat(100);
        let chunks = chunker(30, 10).chunk(&doc(&text));
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.sequence_index, i);
            assert_eq!(
                chunk.metadata.end_offset - chunk.metadata.start_offset,
                chunk.char_len()
            );
        }
        assert_eq!(chunks.last().unwrap().metadata.end_offset, 100);
    }

    proptest! {
        #[test]
        fn prop_chunk_invariants(
            text in "[a-zA-Z0-9 .!?\n\u{e9}\u{4e2d}]{0,600}",
            size in 1usize..120,
            overlap_seed in 0usize..120,
        ) {
            let overlap = overlap_seed % size;
            let chunker = chunker(size, overlap);
            let document = doc(&text);
            let chunks = chunker.chunk(&document);

            if text.trim().is_empty() {
                prop_assert!(chunks.is_empty());
            } else {
                for chunk in &chunks {
                    prop_assert!(chunk.char_len() <= size);
                    prop_assert!(chunk.char_len() > 0);
                }
                for pair in chunks.windows(2) {
                    let prev: Vec<char> = pair[0].text.chars().collect();
                    let tail: String = prev[prev.len() - overlap..].iter().collect();
                    let head: String = pair[1].text.chars().take(overlap).collect();
                    prop_assert_eq!(tail, head);
                }
                prop_assert_eq!(reconstruct(&chunks, overlap), text.clone());
                prop_assert_eq!(chunker.chunk(&document), chunks);
            }
        }
    }
}
