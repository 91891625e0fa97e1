//! Policy RAG CLI entry point.

use clap::Parser;

use policy_rag::cli::{handle_error, run, Cli};
use policy_rag::infrastructure::logging::LoggerImpl;
use policy_rag::ConfigLoader;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json = cli.json;

    let config = match ConfigLoader::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => handle_error(err, json),
    };
    let _logger = match LoggerImpl::init(&config.logging) {
        Ok(logger) => logger,
        Err(err) => handle_error(err, json),
    };

    if let Err(err) = run(cli, config).await {
        handle_error(err, json);
    }
}
