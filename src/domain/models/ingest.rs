//! Ingestion request and report models.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::chunking::ChunkingConfig;

/// What to do when the target collection already holds entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestPolicy {
    /// Leave the collection untouched and report a skipped run.
    #[default]
    SkipIfPresent,
    /// Drop existing entries and store the fresh ones in the same transaction.
    Replace,
    /// Add entries next to the existing ones. Duplicates are kept.
    Append,
}

impl IngestPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SkipIfPresent => "skip_if_present",
            Self::Replace => "replace",
            Self::Append => "append",
        }
    }
}

impl fmt::Display for IngestPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IngestPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "skip_if_present" | "skip" => Ok(Self::SkipIfPresent),
            "replace" => Ok(Self::Replace),
            "append" => Ok(Self::Append),
            other => Err(format!(
                "unknown ingest policy '{other}' (expected skip-if-present, replace or append)"
            )),
        }
    }
}

/// Parameters of one ingestion run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestRequest {
    pub source_dir: PathBuf,
    pub collection: String,
    pub chunking: ChunkingConfig,
    pub policy: IngestPolicy,
    /// File extensions to load, without the leading dot.
    pub extensions: Vec<String>,
}

impl IngestRequest {
    pub fn new(source_dir: impl Into<PathBuf>, collection: impl Into<String>) -> Self {
        Self {
            source_dir: source_dir.into(),
            collection: collection.into(),
            chunking: ChunkingConfig::default(),
            policy: IngestPolicy::default(),
            extensions: vec!["txt".to_string()],
        }
    }

    pub fn with_policy(mut self, policy: IngestPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_chunking(mut self, chunking: ChunkingConfig) -> Self {
        self.chunking = chunking;
        self
    }

    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }
}

/// Outcome of an ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub collection: String,
    pub policy: IngestPolicy,
    /// Documents read and chunked.
    pub documents_loaded: usize,
    /// Files skipped because they could not be read or decoded.
    pub documents_skipped: usize,
    /// Entries written by this run.
    pub chunks_stored: usize,
    /// Entries removed by a `replace` run.
    pub entries_replaced: usize,
    /// True when `skip_if_present` found existing entries and did nothing.
    pub skipped_existing: bool,
}
