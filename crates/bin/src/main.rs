//! SectorLens command-line tool.
//!
//! Fetches daily prices for the sector ETFs, the benchmark and the volatility
//! index, computes per-period metrics and rolling correlations, and writes
//! the workbook, CSV/JSON exports and charts into a timestamped directory.
//!
//! Settings come from `sectorlens.toml` and `SECTORLENS__*` environment
//! variables; see the `sectorlens` crate for the keys.

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use sectorlens::{Pipeline, RunSummary, Settings};
use sectorlens_data::yahoo::YahooQuoteProvider;
use std::process;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sectorlens")]
#[command(about = "Sector ETF performance and correlation reports", long_about = None)]
#[command(version)]
struct Cli {}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let _cli = Cli::parse();

    let settings = Settings::load()?;

    let provider = YahooQuoteProvider::with_rate_limit(Duration::from_millis(
        settings.fetch.request_delay_ms,
    ))?
    .with_price_field(settings.fetch.price_field());

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("█▓░"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));

    let summary = Pipeline::new(settings, provider).run(Some(&pb)).await?;
    print_summary(&summary);

    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!("\n=== Run Complete ===");
    println!("Output directory: {}", summary.output_dir.display());
    if let Some(date) = summary.latest_common_date {
        println!("Latest common date: {date}");
    }
    println!("Instruments fetched: {}", summary.fetched.len());
    println!("Metric rows: {}", summary.metric_rows);

    if !summary.failed.is_empty() {
        println!("\nSkipped instruments:");
        for failed in &summary.failed {
            println!("  {}: {}", failed.symbol, failed.reason);
        }
    }

    println!("\nArtifacts:");
    for artifact in &summary.artifacts {
        println!("  {artifact}");
    }
}
