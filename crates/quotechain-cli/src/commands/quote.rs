use quotechain_core::{FetchOrchestrator, StockCode};

use crate::cli::{Cli, QuoteArgs};
use crate::error::CliError;
use crate::output;

pub async fn run(
    args: &QuoteArgs,
    cli: &Cli,
    orchestrator: &FetchOrchestrator,
) -> Result<(), CliError> {
    let code = StockCode::parse(&args.code)?;
    let annotated = orchestrator.fetch_quote(&code).await?;
    output::render(&annotated, cli.format, cli.pretty)
}
