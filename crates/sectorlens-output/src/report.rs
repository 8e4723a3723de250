//! Report assembly for SectorLens runs.

use chrono::{DateTime, NaiveDate, Utc};
use sectorlens_data::ValidationReport;
use sectorlens_risk::MetricRow;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Spreadsheet error.
    #[error("Spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Ordering of metric rows in tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Highest Sharpe ratio first.
    #[default]
    SharpeDesc,
    /// Highest Sortino ratio first.
    SortinoDesc,
    /// Highest total return first.
    TotalReturnDesc,
    /// Highest annualized return first.
    AnnualizedReturnDesc,
    /// Periods in order of first appearance, then symbol.
    PeriodThenSymbol,
}

impl SortKey {
    fn metric(self, row: &MetricRow) -> Option<f64> {
        match self {
            Self::SharpeDesc => Some(row.sharpe_ratio),
            Self::SortinoDesc => Some(row.sortino_ratio),
            Self::TotalReturnDesc => Some(row.total_return),
            Self::AnnualizedReturnDesc => Some(row.annualized_return),
            Self::PeriodThenSymbol => None,
        }
    }
}

/// Descending with NaN last.
fn descending(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.total_cmp(&a),
    }
}

/// Sort rows in place; ties are broken by symbol.
pub fn sort_rows<R: Borrow<MetricRow>>(rows: &mut [R], key: SortKey) {
    if key == SortKey::PeriodThenSymbol {
        let mut rank: HashMap<String, usize> = HashMap::new();
        for row in rows.iter() {
            let next = rank.len();
            rank.entry(row.borrow().period.clone()).or_insert(next);
        }
        rows.sort_by(|a, b| {
            let (a, b): (&MetricRow, &MetricRow) = (a.borrow(), b.borrow());
            rank[&a.period]
                .cmp(&rank[&b.period])
                .then_with(|| a.symbol.cmp(&b.symbol))
        });
        return;
    }

    rows.sort_by(|a, b| {
        let (a, b): (&MetricRow, &MetricRow) = (a.borrow(), b.borrow());
        let (x, y) = (key.metric(a), key.metric(b));
        descending(x.unwrap_or(f64::NAN), y.unwrap_or(f64::NAN))
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
}

/// Metric rows with display names, grouped into per-period views.
#[derive(Debug, Clone)]
pub struct MetricsReport {
    rows: Vec<MetricRow>,
    periods: Vec<String>,
    names: HashMap<String, String>,
    sort_key: SortKey,
}

impl MetricsReport {
    /// Create a report over `rows` for the given period labels, in order.
    pub fn new(rows: Vec<MetricRow>, periods: Vec<String>, sort_key: SortKey) -> Self {
        Self {
            rows,
            periods,
            names: HashMap::new(),
            sort_key,
        }
    }

    /// Attach display names keyed by symbol.
    pub fn with_names(mut self, names: HashMap<String, String>) -> Self {
        self.names = names;
        self
    }

    /// Display name of a symbol, the symbol itself when unknown.
    pub fn name_of<'a>(&'a self, symbol: &'a str) -> &'a str {
        self.names.get(symbol).map_or(symbol, String::as_str)
    }

    /// Period labels in report order.
    pub fn periods(&self) -> &[String] {
        &self.periods
    }

    /// Configured sort key.
    pub const fn sort_key(&self) -> SortKey {
        self.sort_key
    }

    /// All rows in computation order.
    pub fn rows(&self) -> &[MetricRow] {
        &self.rows
    }

    /// Rows of one period sorted by the configured key.
    pub fn period_view(&self, label: &str) -> Vec<&MetricRow> {
        let mut view: Vec<&MetricRow> = self.rows.iter().filter(|r| r.period == label).collect();
        sort_rows(&mut view, self.sort_key);
        view
    }

    /// All rows, periods in report order then symbol.
    pub fn all_view(&self) -> Vec<&MetricRow> {
        let rank: HashMap<&str, usize> = self
            .periods
            .iter()
            .enumerate()
            .map(|(i, p)| (p.as_str(), i))
            .collect();
        let mut view: Vec<&MetricRow> = self.rows.iter().collect();
        view.sort_by(|a, b| {
            let ra = rank.get(a.period.as_str()).unwrap_or(&usize::MAX);
            let rb = rank.get(b.period.as_str()).unwrap_or(&usize::MAX);
            ra.cmp(rb).then_with(|| a.symbol.cmp(&b.symbol))
        });
        view
    }
}

/// A symbol that could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedSymbol {
    /// Ticker symbol.
    pub symbol: String,
    /// Why it was skipped.
    pub reason: String,
}

/// Machine-readable summary of a run, written as `report.json`.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Report generation timestamp.
    pub timestamp: DateTime<Utc>,

    /// Requested first date.
    pub start_date: NaiveDate,

    /// Requested last date.
    pub end_date: NaiveDate,

    /// Earliest of the fetched instruments' last dates.
    pub latest_common_date: Option<NaiveDate>,

    /// Benchmark symbol.
    pub benchmark: String,

    /// Symbols with usable data.
    pub fetched: Vec<String>,

    /// Symbols that were skipped.
    pub failed: Vec<FailedSymbol>,

    /// Fetched symbols whose raw data needed repair.
    pub integrity_issues: Vec<ValidationReport>,

    /// Files written to the run directory.
    pub artifacts: Vec<String>,

    /// Every metric row, NaN serialized as null.
    pub metrics: Vec<MetricRow>,
}

impl RunReport {
    /// Create a new report stamped with the current time.
    pub fn new(start_date: NaiveDate, end_date: NaiveDate, benchmark: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            start_date,
            end_date,
            latest_common_date: None,
            benchmark: benchmark.into(),
            fetched: Vec::new(),
            failed: Vec::new(),
            integrity_issues: Vec::new(),
            artifacts: Vec::new(),
            metrics: Vec::new(),
        }
    }

    /// Convert report to JSON string.
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the JSON report to `path`.
    pub fn write_to(&self, path: &Path) -> Result<(), ReportError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
