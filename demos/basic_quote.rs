//! # Basic Quote Demo
//!
//! Fetches one quote through the full multi-source chain: spot snapshot
//! first under a bounded timeout, then Sina, Tencent, and EastMoney.
//!
//! ```bash
//! cargo run -p quotechain-core --example basic_quote
//! ```

use quotechain_core::{FetchOrchestrator, OrchestratorConfig, StockCode};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let orchestrator = FetchOrchestrator::with_default_sources(OrchestratorConfig::default());

    let code = StockCode::parse("600519")?;
    let annotated = orchestrator.fetch_quote(&code).await?;

    println!(
        "{} {}: open {} close {} high {} low {} volume {}",
        code,
        annotated.quote.name,
        annotated.quote.open,
        annotated.quote.close,
        annotated.quote.high,
        annotated.quote.low,
        annotated.quote.volume
    );
    println!(
        "source: {} fetched at: {}",
        annotated.source, annotated.fetched_at
    );

    Ok(())
}
