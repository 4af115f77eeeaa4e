//! # Custom Source Adapter Demo
//!
//! Implements [`QuoteSource`] for an in-process source and registers it as
//! the only entry in the fallback chain. Useful as a template for adding a
//! new provider or a deterministic source for tests.
//!
//! ```bash
//! cargo run -p quotechain-core --example custom_adapter
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use quotechain_core::adapter::{QuoteSource, SourceError};
use quotechain_core::{FetchOrchestrator, OrchestratorConfig, Quote, SourceId, StockCode};

/// Serves a fixed quote for exactly one code.
struct FixtureSource {
    code: StockCode,
    quote: Quote,
}

impl QuoteSource for FixtureSource {
    fn id(&self) -> SourceId {
        // Reuse an existing tag; a real integration would extend SourceId.
        SourceId::Spot
    }

    fn fetch_quote<'a>(
        &'a self,
        code: &'a StockCode,
    ) -> Pin<Box<dyn Future<Output = Result<Quote, SourceError>> + Send + 'a>> {
        Box::pin(async move {
            if code == &self.code {
                Ok(self.quote.clone())
            } else {
                Err(SourceError::not_found("fixture only serves one code"))
            }
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let code = StockCode::parse("600519")?;
    let fixture = FixtureSource {
        code: code.clone(),
        quote: Quote::new("贵州茅台", 1700.0, 1712.3, 1720.0, 1698.5, 283_140)?,
    };

    let mut orchestrator = FetchOrchestrator::new(OrchestratorConfig::default());
    orchestrator.register(Arc::new(fixture));

    let annotated = orchestrator.fetch_quote(&code).await?;
    println!(
        "{}: {} via {}",
        code, annotated.quote.close, annotated.source
    );

    Ok(())
}
