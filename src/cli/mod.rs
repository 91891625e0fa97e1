//! Command-line interface.
//!
//! Every command follows the same shape: an `Args` struct, an `execute`
//! function and an output type implementing [`output::CommandOutput`].

pub mod commands;
pub mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::domain::models::Config;
use commands::{ask::AskArgs, chat::ChatArgs, ingest::IngestArgs, reset::ResetArgs, serve::ServeArgs};

#[derive(Parser, Debug)]
#[command(name = "policy-rag")]
#[command(about = "Policy assistant for bus provider documents", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Additional YAML configuration file, merged over .policy-rag/*.yaml
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load, chunk, embed and store the policy documents
    Ingest(IngestArgs),

    /// Answer a single question
    Ask(AskArgs),

    /// Interactive question loop
    Chat(ChatArgs),

    /// List stored collections
    Collections,

    /// Delete a collection and all its entries
    Reset(ResetArgs),

    /// Serve the HTTP API
    Serve(ServeArgs),

    /// Print the effective configuration (API key redacted)
    Config,
}

/// Dispatch a parsed command with the loaded configuration.
pub async fn run(cli: Cli, config: Config) -> Result<()> {
    let json = cli.json;
    match cli.command {
        Commands::Ingest(args) => commands::ingest::execute(args, config, json).await,
        Commands::Ask(args) => commands::ask::execute(args, config, json).await,
        Commands::Chat(args) => commands::chat::execute(args, config, json).await,
        Commands::Collections => commands::collections::execute(config, json).await,
        Commands::Reset(args) => commands::reset::execute(args, config, json).await,
        Commands::Serve(args) => commands::serve::execute(args, config).await,
        Commands::Config => commands::config::execute(&config, json),
    }
}

/// Print `err` with its cause chain and exit with status 1.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let causes: Vec<String> = err.chain().skip(1).map(ToString::to_string).collect();
        let body = serde_json::json!({ "error": err.to_string(), "causes": causes });
        println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("{} {err:#}", console::style("Error:").red().bold());
    }
    std::process::exit(1)
}
