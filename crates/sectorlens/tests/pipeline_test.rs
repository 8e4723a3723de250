//! End-to-end runs against an in-memory price source.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use sectorlens::data::{DataError, PricePoint, PriceSeries, PriceSource, validate_points};
use sectorlens::risk::Period;
use sectorlens::{Pipeline, PipelineError, Settings};
use std::collections::HashMap;
use std::path::Path;

/// Serves raw points the way the Yahoo provider does: validated, then cleaned.
struct MemorySource {
    points: HashMap<String, Vec<PricePoint>>,
}

impl PriceSource for MemorySource {
    async fn fetch_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> sectorlens::data::Result<PriceSeries> {
        let raw: Vec<PricePoint> = self
            .points
            .get(symbol)
            .ok_or_else(|| DataError::missing(symbol, "simulated provider outage"))?
            .iter()
            .filter(|p| p.date >= start && p.date <= end)
            .copied()
            .collect();
        let report = validate_points(symbol, &raw);
        Ok(PriceSeries::from_points(symbol, raw).with_validation(report))
    }
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// Weekday prices from 2020 through 2023 with a symbol-specific wobble.
fn synthetic(phase: f64, drift: f64) -> Vec<PricePoint> {
    let mut points = Vec::new();
    let mut date = d(2020, 1, 1);
    let mut i = 0.0;
    while date <= d(2023, 12, 29) {
        if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            let price = 100.0 * (1.0 + drift).powf(i) * (1.0 + 0.02 * (i * 0.3 + phase).sin());
            points.push(PricePoint::new(date, price));
            i += 1.0;
        }
        date += Duration::days(1);
    }
    points
}

fn source(symbols: &[(&str, f64, f64)]) -> MemorySource {
    MemorySource {
        points: symbols
            .iter()
            .map(|(s, phase, drift)| (s.to_string(), synthetic(*phase, *drift)))
            .collect(),
    }
}

fn is_empty_dir(path: &Path) -> bool {
    std::fs::read_dir(path).unwrap().next().is_none()
}

fn settings(root: &Path) -> Settings {
    let mut settings = Settings::default();
    settings.universe.sectors = vec!["XLK".to_string(), "XLE".to_string(), "XLF".to_string()];
    settings.range.start_date = d(2020, 1, 1);
    settings.range.end_date = Some(d(2023, 12, 31));
    settings.analysis.rolling_window = 20;
    settings.analysis.periods = vec![Period::new("3Y", 3), Period::new("1Y", 1)];
    settings.output.root = root.to_path_buf();
    settings
}

#[tokio::test]
async fn test_failed_instrument_is_absent_from_complete_report() {
    let root = tempfile::tempdir().unwrap();
    // XLF is never served
    let mut source = source(&[
        ("^GSPC", 0.0, 0.0003),
        ("XLK", 0.5, 0.0005),
        ("XLE", 2.0, 0.0001),
        ("^VIX", 1.0, 0.0),
    ]);
    // the provider repeats XLE's last quote
    let xle = source.points.get_mut("XLE").unwrap();
    let last = *xle.last().unwrap();
    xle.push(last);

    let summary = Pipeline::new(settings(root.path()), source)
        .run(None)
        .await
        .unwrap();

    assert!(summary.output_dir.starts_with(root.path()));
    assert_eq!(summary.fetched, vec!["^GSPC", "XLK", "XLE", "^VIX"]);
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].symbol, "XLF");
    assert_eq!(summary.latest_common_date, Some(d(2023, 12, 29)));
    // two periods for each fetched instrument
    assert_eq!(summary.metric_rows, 8);

    for file in [
        "metrics.xlsx",
        "metrics.csv",
        "rolling_correlation.csv",
        "report.json",
        "cumulative_returns.png",
        "rolling_correlation.png",
        "relative_performance.png",
        "correlation_heatmap_full.png",
        "correlation_heatmap_3Y.png",
        "correlation_heatmap_1Y.png",
    ] {
        let path = summary.output_dir.join(file);
        assert!(path.is_file(), "{file} missing");
        assert!(std::fs::metadata(&path).unwrap().len() > 0, "{file} is empty");
        assert!(summary.artifacts.iter().any(|a| a == file), "{file} not listed");
    }

    let csv = std::fs::read_to_string(summary.output_dir.join("metrics.csv")).unwrap();
    assert_eq!(csv.lines().count(), 9);
    assert!(!csv.contains("XLF"));
    assert!(csv.contains("XLK,Information Technology,3Y"));

    let rolling = std::fs::read_to_string(summary.output_dir.join("rolling_correlation.csv")).unwrap();
    assert!(!rolling.contains("\n^GSPC,"));
    assert!(rolling.contains("XLE,^GSPC,"));

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(summary.output_dir.join("report.json")).unwrap())
            .unwrap();
    assert_eq!(report["failed"][0]["symbol"], "XLF");
    let issues = report["integrity_issues"].as_array().unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0]["symbol"], "XLE");
    assert_eq!(issues[0]["duplicate_dates"], 1);
    assert_eq!(report["latest_common_date"], "2023-12-29");
    assert_eq!(report["metrics"].as_array().unwrap().len(), 8);
    assert_eq!(report["metrics"][0]["period"], "3Y");
}

#[tokio::test]
async fn test_runs_get_separate_directories() {
    let root = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(
        settings(root.path()),
        source(&[("^GSPC", 0.0, 0.0003), ("XLK", 0.5, 0.0005)]),
    );

    let first = pipeline.run(None).await.unwrap();
    let second = pipeline.run(None).await.unwrap();
    assert_ne!(first.output_dir, second.output_dir);
}

#[tokio::test]
async fn test_missing_benchmark_is_fatal() {
    let root = tempfile::tempdir().unwrap();
    let result = Pipeline::new(settings(root.path()), source(&[("XLK", 0.5, 0.0005)]))
        .run(None)
        .await;

    assert!(matches!(result, Err(PipelineError::MissingBenchmark(ref s)) if s == "^GSPC"));
    assert!(is_empty_dir(root.path()));
}

#[tokio::test]
async fn test_no_data_is_fatal() {
    let root = tempfile::tempdir().unwrap();
    let result = Pipeline::new(settings(root.path()), source(&[])).run(None).await;

    assert!(matches!(result, Err(PipelineError::NoData)));
    assert!(is_empty_dir(root.path()));
}
