mod bench;
mod quote;

use quotechain_core::{FetchOrchestrator, OrchestratorConfig};
use std::time::Duration;

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub async fn run(cli: &Cli) -> Result<(), CliError> {
    let orchestrator = build_orchestrator(cli);
    match &cli.command {
        Command::Quote(args) => quote::run(args, cli, &orchestrator).await,
        Command::Bench(args) => bench::run(args, &orchestrator).await,
    }
}

fn build_orchestrator(cli: &Cli) -> FetchOrchestrator {
    let config = OrchestratorConfig {
        primary_timeout: Duration::from_secs(cli.primary_timeout_secs),
        max_retries: cli.max_retries.max(1),
        ..OrchestratorConfig::default()
    };
    let orchestrator = FetchOrchestrator::with_default_sources(config);
    log::debug!(
        "configured sources in consultation order: {:?}",
        orchestrator.source_ids()
    );
    orchestrator
}
