//! Grounded prompt construction.

use crate::domain::models::Chunk;

/// Identifies the template wording; bump when the text below changes.
pub const PROMPT_TEMPLATE_VERSION: &str = "policy-qa/v1";

/// Separator placed between chunk texts in the CONTEXT block.
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// CONTEXT body used when retrieval found nothing.
pub const NO_CONTEXT_MARKER: &str = "(no context available)";

const PREAMBLE: &str = "You are an expert bus ticket service assistant. \
Use ONLY the following retrieved context to answer the user's question about bus provider \
policies, contact details, or specific rules. If the information is not found in the context, \
politely state that you cannot answer based on the available provider data.";

/// Builds the prompt sent to the generation client.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptAssembler;

impl PromptAssembler {
    pub fn new() -> Self {
        Self
    }

    pub fn version(&self) -> &'static str {
        PROMPT_TEMPLATE_VERSION
    }

    /// Chunk texts in order, separated by [`CONTEXT_SEPARATOR`].
    pub fn context_block(&self, chunks: &[Chunk]) -> String {
        if chunks.is_empty() {
            return NO_CONTEXT_MARKER.to_string();
        }
        chunks
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR)
    }

    pub fn assemble(&self, query: &str, chunks: &[Chunk]) -> String {
        format!(
            "{PREAMBLE}\n\nCONTEXT:\n{}\n\nQUESTION: {}\n\nANSWER:",
            self.context_block(chunks),
            query.trim()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{BoundaryKind, ChunkMetadata};

    fn chunk(text: &str, index: usize) -> Chunk {
        Chunk::new(
            text.to_string(),
            ChunkMetadata::new("p.txt", 0, text.chars().count(), BoundaryKind::Sentence),
            index,
        )
    }

    #[test]
    fn test_context_keeps_order_and_separator() {
        let prompt = PromptAssembler::new().assemble(
            "How long do refunds take?",
            &[chunk("Refunds take 14 days.", 0), chunk("Call 555-0100.", 1)],
        );

        assert!(prompt.contains("CONTEXT:\nRefunds take 14 days.\n\n---\n\nCall 555-0100.\n\nQUESTION:"));
        assert!(prompt.contains("QUESTION: How long do refunds take?"));
        assert!(prompt.ends_with("ANSWER:"));
        assert!(prompt.contains("Use ONLY the following retrieved context"));
    }

    #[test]
    fn test_empty_context_marker() {
        let prompt = PromptAssembler::new().assemble("Anything?", &[]);
        assert!(prompt.contains(&format!("CONTEXT:\n{NO_CONTEXT_MARKER}\n")));
        assert!(prompt.contains("cannot answer based on the available provider data"));
    }

    #[test]
    fn test_deterministic() {
        let assembler = PromptAssembler::new();
        let chunks = [chunk("a", 0)];
        assert_eq!(assembler.assemble("q", &chunks), assembler.assemble("q", &chunks));
        assert_eq!(assembler.version(), "policy-qa/v1");
    }
}
