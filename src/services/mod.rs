pub mod chunker;
pub mod document_loader;
pub mod ingestion_service;
pub mod prompt_assembler;
pub mod query_service;
pub mod retriever;

#[cfg(test)]
pub(crate) mod test_support;

pub use chunker::Chunker;
pub use document_loader::{DocumentIter, DocumentLoader};
pub use ingestion_service::IngestionService;
pub use prompt_assembler::{PromptAssembler, PROMPT_TEMPLATE_VERSION};
pub use query_service::{QueryService, ScoredAnswer};
pub use retriever::Retriever;
