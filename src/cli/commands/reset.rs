//! Implementation of the `policy-rag reset` command.

use anyhow::{Context, Result};
use clap::Args;
use console::{style, Term};

use crate::application::RagContext;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;
use crate::domain::ports::VectorStore;

#[derive(Args, Debug)]
pub struct ResetArgs {
    /// Collection to delete
    pub collection: String,

    /// Skip the confirmation prompt
    #[arg(long, short)]
    pub yes: bool,
}

#[derive(Debug, serde::Serialize)]
pub struct ResetOutput {
    pub collection: String,
    pub existed: bool,
    pub entries_removed: usize,
}

impl CommandOutput for ResetOutput {
    fn to_human(&self) -> String {
        if self.existed {
            format!(
                "Deleted collection '{}' ({} entries removed)",
                self.collection, self.entries_removed
            )
        } else {
            format!("Collection '{}' does not exist; nothing to delete", self.collection)
        }
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

fn confirm(collection: &str, entries: usize) -> Result<bool> {
    let term = Term::stderr();
    term.write_str(&format!(
        "Delete collection '{}' with {} entries? [y/N] ",
        style(collection).bold(),
        entries
    ))?;
    let answer = term.read_line().context("Failed to read confirmation")?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

pub async fn execute(args: ResetArgs, config: Config, json_mode: bool) -> Result<()> {
    let store = RagContext::open_vector_store(&config).await?;

    let Some(info) = store.collection(&args.collection).await? else {
        output(
            &ResetOutput {
                collection: args.collection,
                existed: false,
                entries_removed: 0,
            },
            json_mode,
        );
        return Ok(());
    };

    if !args.yes {
        if json_mode {
            anyhow::bail!("Refusing to delete '{}' without --yes in JSON mode", args.collection);
        }
        if !confirm(&args.collection, info.entry_count)? {
            println!("Aborted.");
            return Ok(());
        }
    }

    let entries_removed = store
        .delete_collection(&args.collection)
        .await
        .with_context(|| format!("Failed to delete collection '{}'", args.collection))?;

    output(
        &ResetOutput {
            collection: args.collection,
            existed: true,
            entries_removed,
        },
        json_mode,
    );
    Ok(())
}
