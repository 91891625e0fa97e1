//! Implementation of the `policy-rag collections` command.

use anyhow::{Context, Result};

use crate::application::RagContext;
use crate::cli::output::table::TableFormatter;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{CollectionInfo, Config};
use crate::domain::ports::VectorStore;

#[derive(Debug, serde::Serialize)]
pub struct CollectionsOutput {
    pub collections: Vec<CollectionInfo>,
}

impl CommandOutput for CollectionsOutput {
    fn to_human(&self) -> String {
        if self.collections.is_empty() {
            return "No collections found. Run `policy-rag ingest` first.".to_string();
        }
        format!(
            "{}\n\nShowing {} collection(s)",
            TableFormatter::new().format_collections(&self.collections),
            self.collections.len()
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(config: Config, json_mode: bool) -> Result<()> {
    let store = RagContext::open_vector_store(&config).await?;
    let collections = store
        .list_collections()
        .await
        .context("Failed to list collections")?;

    output(&CollectionsOutput { collections }, json_mode);
    Ok(())
}
