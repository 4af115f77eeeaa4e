//! Latency benchmark over the fallback chain.
//!
//! Fetches each code `rounds` times with a small pause between calls, then
//! reports mean/median/p95 latency and the distribution of winning sources.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use quotechain_core::{FetchOrchestrator, StockCode};

use crate::cli::BenchArgs;
use crate::error::CliError;

// Liquid names across both exchanges and boards.
const DEFAULT_CODES: [&str; 5] = ["600519", "000001", "601318", "300750", "600036"];

const PAUSE_BETWEEN_CALLS: Duration = Duration::from_millis(200);

pub async fn run(args: &BenchArgs, orchestrator: &FetchOrchestrator) -> Result<(), CliError> {
    let codes = resolve_codes(args)?;
    let rounds = args.rounds.max(1);

    let mut latencies_ms: Vec<f64> = Vec::new();
    let mut sources: BTreeMap<String, usize> = BTreeMap::new();
    let mut samples = 0usize;
    let mut failures = 0usize;

    for code in &codes {
        for _ in 0..rounds {
            samples += 1;
            let started = Instant::now();
            match orchestrator.fetch_quote(code).await {
                Ok(annotated) => {
                    latencies_ms.push(started.elapsed().as_secs_f64() * 1000.0);
                    *sources.entry(annotated.source.to_string()).or_insert(0) += 1;
                }
                Err(error) => {
                    failures += 1;
                    eprintln!("[ERROR] code={code}: {error}");
                }
            }
            tokio::time::sleep(PAUSE_BETWEEN_CALLS).await;
        }
    }

    print_report(samples, failures, &mut latencies_ms, &sources);
    Ok(())
}

fn resolve_codes(args: &BenchArgs) -> Result<Vec<StockCode>, CliError> {
    let raw: Vec<&str> = if args.codes.is_empty() {
        DEFAULT_CODES.to_vec()
    } else {
        args.codes.iter().map(String::as_str).collect()
    };

    raw.iter()
        .map(|code| StockCode::parse(code).map_err(CliError::from))
        .collect()
}

fn print_report(
    samples: usize,
    failures: usize,
    latencies_ms: &mut [f64],
    sources: &BTreeMap<String, usize>,
) {
    println!("\n=== 多源查询基准评估 ===");
    println!("样本数: {samples} | 失败数: {failures}");

    if latencies_ms.is_empty() {
        println!("无有效延迟样本");
    } else {
        latencies_ms.sort_by(|a, b| a.total_cmp(b));
        println!("平均延迟(ms): {:.2}", mean(latencies_ms));
        println!("中位延迟(ms): {:.2}", median_sorted(latencies_ms));
        println!("P95延迟(ms): {:.2}", percentile_sorted(latencies_ms, 0.95));
    }

    if sources.is_empty() {
        println!("无数据源样本");
    } else {
        println!("数据源分布:");
        for (source, count) in sources {
            println!(" - {source}: {count}");
        }
    }
}

fn mean(sorted: &[f64]) -> f64 {
    sorted.iter().sum::<f64>() / sorted.len() as f64
}

fn median_sorted(sorted: &[f64]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

fn percentile_sorted(sorted: &[f64], fraction: f64) -> f64 {
    let rank = (sorted.len() as f64 * fraction).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}
