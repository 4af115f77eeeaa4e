//! CLI argument definitions for quotechain.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `quote` | Fetch one quote through the multi-source chain |
//! | `bench` | Measure fetch latency and source distribution |
//!
//! # Examples
//!
//! ```bash
//! # Fetch a quote as a labeled text block
//! quotechain quote 600519
//!
//! # Machine-readable output
//! quotechain quote 600519 --format json --pretty
//!
//! # Latency benchmark over the default code set
//! quotechain bench --rounds 3
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Resilient A-share quote fetcher with robots-aware multi-source fallback.
#[derive(Debug, Parser)]
#[command(
    name = "quotechain",
    author,
    version,
    about = "Multi-source A-share quote CLI"
)]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Wall-clock budget in seconds for the primary snapshot source.
    #[arg(long, global = true, default_value_t = 60)]
    pub primary_timeout_secs: u64,

    /// Attempts per source before falling through to the next one.
    #[arg(long, global = true, default_value_t = 3)]
    pub max_retries: u32,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Labeled text block.
    Text,
    /// Single JSON object.
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch the latest quote for one stock code.
    Quote(QuoteArgs),
    /// Run repeated fetches and report latency statistics.
    Bench(BenchArgs),
}

#[derive(Debug, Args)]
pub struct QuoteArgs {
    /// Stock code, e.g. 600519. Short numeric codes are zero-padded.
    pub code: String,
}

#[derive(Debug, Args)]
pub struct BenchArgs {
    /// Codes to benchmark. Defaults to a fixed cross-exchange basket.
    #[arg(long, value_delimiter = ',')]
    pub codes: Vec<String>,

    /// Fetches per code.
    #[arg(long, default_value_t = 3)]
    pub rounds: u32,
}
