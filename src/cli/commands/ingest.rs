//! Implementation of the `policy-rag ingest` command.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::time::Instant;

use crate::application::RagContext;
use crate::cli::output::progress::create_spinner;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{ChunkingConfig, Config, IngestPolicy, IngestReport, IngestRequest};

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Directory holding the policy documents (default: rag.source_dir)
    #[arg(long)]
    pub source_dir: Option<PathBuf>,

    /// Target collection (default: rag.collection_name)
    #[arg(long)]
    pub collection: Option<String>,

    /// Maximum chunk length in characters
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Characters shared by consecutive chunks
    #[arg(long)]
    pub chunk_overlap: Option<usize>,

    /// What to do with existing entries: skip-if-present, replace or append
    #[arg(long)]
    pub policy: Option<IngestPolicy>,

    /// File extension to load, repeatable (default: rag.extensions)
    #[arg(long = "extension", value_name = "EXT")]
    pub extensions: Vec<String>,
}

impl IngestArgs {
    /// Apply the command-line overrides to the configured request.
    pub fn apply(&self, mut request: IngestRequest) -> IngestRequest {
        if let Some(dir) = &self.source_dir {
            request.source_dir.clone_from(dir);
        }
        if let Some(collection) = &self.collection {
            request.collection.clone_from(collection);
        }
        if let Some(policy) = self.policy {
            request.policy = policy;
        }
        if !self.extensions.is_empty() {
            request.extensions.clone_from(&self.extensions);
        }
        request.chunking = ChunkingConfig::new(
            self.chunk_size.unwrap_or(request.chunking.chunk_size),
            self.chunk_overlap.unwrap_or(request.chunking.chunk_overlap),
        );
        request
    }
}

#[derive(Debug, serde::Serialize)]
pub struct IngestOutput {
    #[serde(flatten)]
    pub report: IngestReport,
    pub elapsed_ms: u64,
}

impl CommandOutput for IngestOutput {
    fn to_human(&self) -> String {
        let r = &self.report;
        if r.skipped_existing {
            return format!(
                "Collection '{}' already holds entries; nothing ingested.\n\
                 Use --policy replace to rebuild it or --policy append to add to it.",
                r.collection
            );
        }

        let mut lines = vec![format!(
            "Ingested {} document(s) into '{}': {} chunk(s) stored in {:.1}s",
            r.documents_loaded,
            r.collection,
            r.chunks_stored,
            self.elapsed_ms as f64 / 1000.0
        )];
        if r.entries_replaced > 0 {
            lines.push(format!("  Replaced {} previous entries", r.entries_replaced));
        }
        if r.documents_skipped > 0 {
            lines.push(format!(
                "  Skipped {} unreadable file(s); see the log for details",
                r.documents_skipped
            ));
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: IngestArgs, config: Config, json_mode: bool) -> Result<()> {
    let context = RagContext::initialize(config).await?;
    let request = args.apply(context.ingest_request());

    let spinner = create_spinner(
        format!("Ingesting {} into '{}'", request.source_dir.display(), request.collection),
        json_mode,
    );
    let started = Instant::now();
    let result = context.ingestion().ingest(&request).await;
    spinner.finish_and_clear();

    let report = result.with_context(|| format!("Ingestion into '{}' failed", request.collection))?;
    let output_data = IngestOutput {
        report,
        elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
    };

    output(&output_data, json_mode);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> IngestArgs {
        IngestArgs {
            source_dir: None,
            collection: None,
            chunk_size: None,
            chunk_overlap: None,
            policy: None,
            extensions: vec![],
        }
    }

    #[test]
    fn test_overrides_apply_over_config() {
        let base = IngestRequest::new("data/attachments", "bus_policy_info");
        let request = IngestArgs {
            collection: Some("staging".to_string()),
            chunk_size: Some(256),
            policy: Some(IngestPolicy::Replace),
            extensions: vec!["md".to_string()],
            ..args()
        }
        .apply(base);

        assert_eq!(request.collection, "staging");
        assert_eq!(request.chunking, ChunkingConfig::new(256, 50));
        assert_eq!(request.policy, IngestPolicy::Replace);
        assert_eq!(request.extensions, vec!["md".to_string()]);
        assert_eq!(request.source_dir, PathBuf::from("data/attachments"));
    }

    #[test]
    fn test_human_output_for_skipped_run() {
        let output = IngestOutput {
            report: IngestReport {
                collection: "bus_policy_info".to_string(),
                skipped_existing: true,
                ..IngestReport::default()
            },
            elapsed_ms: 3,
        };
        assert!(output.to_human().contains("already holds entries"));
        assert_eq!(output.to_json()["skipped_existing"], true);
    }
}
