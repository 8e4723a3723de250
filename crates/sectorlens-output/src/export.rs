//! CSV and JSON export of metric rows and rolling correlations.

use crate::report::MetricsReport;
use chrono::NaiveDate;
use sectorlens_risk::{MetricRow, RollingCorrelationSeries};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }
}

/// One metric row flattened for tabular export.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricRecord {
    /// Instrument symbol.
    pub symbol: String,

    /// Display name.
    pub name: String,

    /// Period label.
    pub period: String,

    /// First date of the slice.
    pub start: NaiveDate,

    /// Last date of the slice.
    pub end: NaiveDate,

    /// Number of prices in the slice.
    pub observations: usize,

    /// Whether the history covers the whole period.
    pub full_history: bool,

    /// Total return.
    pub total_return: f64,

    /// Annualized return.
    pub annualized_return: f64,

    /// Annualized volatility.
    pub volatility: f64,

    /// Sharpe ratio.
    pub sharpe_ratio: f64,

    /// Sortino ratio.
    pub sortino_ratio: f64,

    /// Total return minus the benchmark's.
    pub relative_return: f64,
}

impl MetricRecord {
    /// Flatten a metric row with its display name.
    pub fn new(row: &MetricRow, name: &str) -> Self {
        Self {
            symbol: row.symbol.clone(),
            name: name.to_string(),
            period: row.period.clone(),
            start: row.start,
            end: row.end,
            observations: row.observations,
            full_history: row.full_history,
            total_return: row.total_return,
            annualized_return: row.annualized_return,
            volatility: row.volatility,
            sharpe_ratio: row.sharpe_ratio,
            sortino_ratio: row.sortino_ratio,
            relative_return: row.relative_return,
        }
    }

    /// Records for every row of a report, period then symbol.
    pub fn from_report(report: &MetricsReport) -> Vec<Self> {
        report
            .all_view()
            .into_iter()
            .map(|row| Self::new(row, report.name_of(&row.symbol)))
            .collect()
    }
}

/// One dated rolling correlation value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CorrelationRecord {
    /// Instrument symbol.
    pub symbol: String,

    /// Benchmark symbol.
    pub benchmark: String,

    /// Last date of the window.
    pub date: NaiveDate,

    /// Window length in trading days.
    pub window: usize,

    /// Correlation value.
    pub correlation: f64,
}

impl CorrelationRecord {
    /// Long-format records for a set of rolling correlation series.
    pub fn from_series(series: &[RollingCorrelationSeries]) -> Vec<Self> {
        series
            .iter()
            .flat_map(|s| {
                s.points.iter().map(move |p| Self {
                    symbol: s.symbol.clone(),
                    benchmark: s.benchmark.clone(),
                    date: p.date,
                    window: s.window,
                    correlation: p.value,
                })
            })
            .collect()
    }
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

fn records_to_csv<T: Serialize>(records: &[T]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for record in records {
        wtr.serialize(record)?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes).map_err(|e| ExportError::InvalidFormat(e.to_string()))
}

impl Exporter for Vec<MetricRecord> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => records_to_csv(self),
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

impl Exporter for Vec<CorrelationRecord> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => records_to_csv(self),
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}
