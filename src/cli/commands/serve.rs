//! Implementation of the `policy-rag serve` command.

use anyhow::{Context, Result};
use clap::Args;
use std::sync::Arc;
use tracing::info;

use crate::adapters::http::{PolicyHttpConfig, PolicyHttpServer};
use crate::application::RagContext;
use crate::domain::models::Config;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Host to bind to (default: server.host)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (default: server.port)
    #[arg(long, short)]
    pub port: Option<u16>,
}

impl ServeArgs {
    pub fn http_config(&self, config: &Config) -> PolicyHttpConfig {
        let mut http = PolicyHttpConfig::from(&config.server);
        if let Some(host) = &self.host {
            http.host.clone_from(host);
        }
        if let Some(port) = self.port {
            http.port = port;
        }
        http
    }
}

pub async fn execute(args: ServeArgs, config: Config) -> Result<()> {
    let http_config = args.http_config(&config);
    let context = Arc::new(RagContext::initialize(config).await?);

    if let Some(report) = context
        .ingest_on_startup()
        .await
        .context("Startup ingestion failed")?
    {
        info!(
            collection = %report.collection,
            chunks_stored = report.chunks_stored,
            skipped_existing = report.skipped_existing,
            "Startup ingestion finished"
        );
    }

    PolicyHttpServer::new(context, http_config)
        .serve_with_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutdown signal received");
            }
        })
        .await
}
