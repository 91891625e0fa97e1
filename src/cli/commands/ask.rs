//! Implementation of the `policy-rag ask` command.

use anyhow::{Context, Result};
use clap::Args;
use std::num::NonZeroUsize;

use crate::application::RagContext;
use crate::cli::output::table::TableFormatter;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Config, SearchResult};
use crate::services::QueryService;

#[derive(Args, Debug)]
pub struct AskArgs {
    /// Question about bus provider policies
    pub question: String,

    /// Collection to search (default: rag.collection_name)
    #[arg(long)]
    pub collection: Option<String>,

    /// Number of chunks to retrieve (default: rag.top_k)
    #[arg(long)]
    pub top_k: Option<NonZeroUsize>,

    /// Also print the retrieved chunks with their similarity
    #[arg(long)]
    pub show_sources: bool,
}

#[derive(Debug, serde::Serialize)]
pub struct AskOutput {
    pub question: String,
    pub answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<SearchResult>>,
}

impl CommandOutput for AskOutput {
    fn to_human(&self) -> String {
        let mut text = self.answer.clone();
        if let Some(sources) = &self.sources {
            text.push_str("\n\nSources:\n");
            if sources.is_empty() {
                text.push_str("(no chunks retrieved)");
            } else {
                text.push_str(&TableFormatter::new().format_sources(sources));
            }
        }
        text
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Answer `question` with the same never-fail contract as
/// [`QueryService::answer`], keeping the scored sources.
pub async fn answer_with_sources(
    service: &QueryService,
    question: &str,
    collection: &str,
    k: usize,
) -> (String, Vec<SearchResult>) {
    match service.run_scored(question, collection, k).await {
        Ok(scored) => (scored.result.answer, scored.sources),
        Err(e) => (QueryService::failure_reply(&e).to_string(), Vec::new()),
    }
}

pub async fn execute(args: AskArgs, config: Config, json_mode: bool) -> Result<()> {
    let context = RagContext::initialize(config).await?;
    context
        .ingest_on_startup()
        .await
        .context("Startup ingestion failed")?;

    let service = context.query();
    let collection = args.collection.as_deref().unwrap_or_else(|| context.collection());
    let k = args.top_k.map_or(service.top_k(), NonZeroUsize::get);

    let (answer, sources) = answer_with_sources(&service, &args.question, collection, k).await;
    let output_data = AskOutput {
        question: args.question,
        answer,
        sources: args.show_sources.then_some(sources),
    };

    output(&output_data, json_mode);
    Ok(())
}
