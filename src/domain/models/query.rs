//! Query pipeline models.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::chunking::Chunk;

/// Outcome of one answered question. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub query: String,
    /// Ranked by similarity, most similar first.
    pub retrieved_chunks: Vec<Chunk>,
    pub answer: String,
}

/// Pipeline stage of a query, recorded on the tracing span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStage {
    EmbeddingQuery,
    Searching,
    AssemblingPrompt,
    Generating,
    Done,
    Failed,
}

impl QueryStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmbeddingQuery => "embedding_query",
            Self::Searching => "searching",
            Self::AssemblingPrompt => "assembling_prompt",
            Self::Generating => "generating",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for QueryStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
