//! Implementation of the `policy-rag chat` command.
//!
//! The query pipeline is stateless; the loop keeps the transcript so it can
//! be shown again with `/history` and emitted as JSON on exit.

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use serde::Serialize;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::application::RagContext;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;

const GREETING: &str = "Ask a question about bus provider policies. \
Commands: /history, /clear, /exit.";

#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Collection to search (default: rag.collection_name)
    #[arg(long)]
    pub collection: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
}

/// Chat history, in display order.
#[derive(Debug, Default, Serialize)]
pub struct Transcript {
    pub turns: Vec<Turn>,
}

impl Transcript {
    pub fn push(&mut self, speaker: Speaker, text: impl Into<String>) {
        self.turns.push(Turn {
            speaker,
            text: text.into(),
        });
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

impl CommandOutput for Transcript {
    fn to_human(&self) -> String {
        if self.turns.is_empty() {
            return "(no messages yet)".to_string();
        }
        self.turns
            .iter()
            .map(|turn| match turn.speaker {
                Speaker::User => format!("{} {}", style("you>").cyan().bold(), turn.text),
                Speaker::Assistant => format!("{} {}", style("bot>").green().bold(), turn.text),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// A line typed at the prompt.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Question(&'a str),
    History,
    Clear,
    Exit,
    Blank,
}

fn parse_input(line: &str) -> Input<'_> {
    match line.trim() {
        "" => Input::Blank,
        "/exit" | "/quit" => Input::Exit,
        "/history" => Input::History,
        "/clear" => Input::Clear,
        question => Input::Question(question),
    }
}

pub async fn execute(args: ChatArgs, config: Config, json_mode: bool) -> Result<()> {
    let context = RagContext::initialize(config).await?;
    context
        .ingest_on_startup()
        .await
        .context("Startup ingestion failed")?;

    let service = context.query();
    let collection = args.collection.as_deref().unwrap_or_else(|| context.collection());
    let mut transcript = Transcript::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    if !json_mode {
        println!("{GREETING}");
    }
    loop {
        if !json_mode {
            print!("{} ", style("you>").cyan().bold());
            std::io::stdout().flush().ok();
        }
        let Some(line) = lines.next_line().await.context("Failed to read from stdin")? else {
            break;
        };

        match parse_input(&line) {
            Input::Blank => {}
            Input::Exit => break,
            Input::History => println!("{}", transcript.to_human()),
            Input::Clear => transcript.clear(),
            Input::Question(question) => {
                let answer = service.answer(question, collection).await;
                if !json_mode {
                    println!("{} {answer}", style("bot>").green().bold());
                }
                transcript.push(Speaker::User, question);
                transcript.push(Speaker::Assistant, answer);
            }
        }
    }

    if json_mode {
        output(&transcript, true);
    }
    Ok(())
}
