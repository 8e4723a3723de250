//! Risk/return metrics per instrument and lookback period.
//!
//! For a period ending at the panel's latest common date the engine reports
//! total return, annualized return, annualized volatility, Sharpe and Sortino
//! ratios, and the return relative to the benchmark over the same dates.
//! Undefined statistics are NaN; nothing here divides by zero.

use crate::error::RiskError;
use crate::period::Period;
use crate::returns::{TRADING_DAYS_PER_YEAR, annualize_return, simple_returns, total_return};
use crate::stats::{downside_std, ratio, sample_std};
use chrono::{Days, NaiveDate};
use sectorlens_data::{PricePanel, PriceSeries};
use serde::{Deserialize, Serialize};

/// What to do with an instrument whose history starts after a period's start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryPolicy {
    /// Leave the instrument out of that period.
    Skip,
    /// Report the instrument with NaN statistics.
    Nan,
    /// Compute over the available data and flag the row as partial.
    #[default]
    Partial,
}

/// Configuration for the metrics engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Annual risk-free rate subtracted in Sharpe and Sortino (default: 0)
    pub risk_free_rate: f64,
    /// Treatment of instruments lacking full history (default: partial)
    pub history_policy: HistoryPolicy,
    /// Calendar days a first observation may lag the period start and still
    /// count as full history (default: 7, covers weekends and holidays)
    pub history_tolerance_days: u32,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.0,
            history_policy: HistoryPolicy::default(),
            history_tolerance_days: 7,
        }
    }
}

/// Metrics for one instrument over one period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRow {
    /// Instrument symbol.
    pub symbol: String,
    /// Period label.
    pub period: String,
    /// First date of the slice (requested start when no data).
    pub start: NaiveDate,
    /// Last date of the slice (requested end when no data).
    pub end: NaiveDate,
    /// Number of prices in the slice.
    pub observations: usize,
    /// Whether the instrument's history covers the whole period.
    pub full_history: bool,
    /// Last / first price - 1.
    pub total_return: f64,
    /// Total return annualized over calendar days.
    pub annualized_return: f64,
    /// Annualized standard deviation of daily returns.
    pub volatility: f64,
    /// Excess annualized return per unit of volatility.
    pub sharpe_ratio: f64,
    /// Excess annualized return per unit of downside deviation.
    pub sortino_ratio: f64,
    /// Total return minus the benchmark's over the same dates.
    pub relative_return: f64,
}

impl MetricRow {
    fn undefined(symbol: &str, period: &Period, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            symbol: symbol.to_string(),
            period: period.label.clone(),
            start,
            end,
            observations: 0,
            full_history: false,
            total_return: f64::NAN,
            annualized_return: f64::NAN,
            volatility: f64::NAN,
            sharpe_ratio: f64::NAN,
            sortino_ratio: f64::NAN,
            relative_return: f64::NAN,
        }
    }
}

/// Statistics of a single price slice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliceStatistics {
    /// Number of prices.
    pub observations: usize,
    /// Calendar days from first to last price.
    pub days: i64,
    /// Last / first price - 1.
    pub total_return: f64,
    /// Annualized total return.
    pub annualized_return: f64,
    /// Annualized volatility of daily returns.
    pub volatility: f64,
    /// Annualized downside deviation.
    pub downside_deviation: f64,
    /// Sharpe ratio.
    pub sharpe_ratio: f64,
    /// Sortino ratio.
    pub sortino_ratio: f64,
}

impl SliceStatistics {
    /// Compute statistics for a slice.
    ///
    /// # Errors
    ///
    /// Returns [`RiskError::InsufficientHistory`] with fewer than two prices.
    pub fn compute(slice: &PriceSeries, risk_free_rate: f64) -> Result<Self, RiskError> {
        let (Some(first), Some(last)) = (slice.first_date(), slice.last_date()) else {
            return Err(insufficient(slice));
        };
        if slice.len() < 2 {
            return Err(insufficient(slice));
        }

        let prices = slice.closes();
        let returns = simple_returns(&prices);
        let annualization = TRADING_DAYS_PER_YEAR.sqrt();

        let days = (last - first).num_days();
        let total = total_return(&prices);
        let annualized = annualize_return(total, days);
        let volatility = sample_std(&returns) * annualization;
        let downside = downside_std(&returns) * annualization;
        let excess = annualized - risk_free_rate;

        Ok(Self {
            observations: prices.len(),
            days,
            total_return: total,
            annualized_return: annualized,
            volatility,
            downside_deviation: downside,
            sharpe_ratio: ratio(excess, volatility),
            sortino_ratio: ratio(excess, downside),
        })
    }
}

fn insufficient(slice: &PriceSeries) -> RiskError {
    RiskError::InsufficientHistory {
        symbol: slice.symbol().to_string(),
        required: 2,
        actual: slice.len(),
    }
}

/// Computes [`MetricRow`]s for every instrument and period.
#[derive(Debug, Clone)]
pub struct MetricsEngine {
    periods: Vec<Period>,
    config: MetricsConfig,
}

impl MetricsEngine {
    /// Create an engine for the given periods.
    pub const fn new(periods: Vec<Period>, config: MetricsConfig) -> Self {
        Self { periods, config }
    }

    /// Configured periods in report order.
    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    /// Metrics for every column of `panel`, period-major in configuration
    /// order, ending at the panel's latest common date.
    ///
    /// # Errors
    ///
    /// Returns [`RiskError::MissingBenchmark`] if `benchmark` is not in the panel.
    pub fn compute(&self, panel: &PricePanel, benchmark: &str) -> Result<Vec<MetricRow>, RiskError> {
        let benchmark_series = panel
            .series(benchmark)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| RiskError::MissingBenchmark(benchmark.to_string()))?;
        let Some(end) = panel.end_date() else {
            return Ok(Vec::new());
        };

        let series: Vec<PriceSeries> = panel
            .symbols()
            .into_iter()
            .filter_map(|symbol| panel.series(symbol))
            .collect();

        let mut rows = Vec::new();
        for period in &self.periods {
            for instrument in &series {
                if let Some(row) = self.row(instrument, &benchmark_series, period, end) {
                    rows.push(row);
                }
            }
        }

        Ok(rows)
    }

    /// Metrics for one instrument over one period ending at `end`.
    ///
    /// Returns `None` when the history policy says to skip the instrument.
    pub fn row(
        &self,
        series: &PriceSeries,
        benchmark: &PriceSeries,
        period: &Period,
        end: NaiveDate,
    ) -> Option<MetricRow> {
        let start = period.start_for(end);
        let policy = self.config.history_policy;
        let full_history = series.first_date().is_some_and(|first| {
            first
                <= start
                    .checked_add_days(Days::new(u64::from(self.config.history_tolerance_days)))
                    .unwrap_or(start)
        });

        if !full_history {
            match policy {
                HistoryPolicy::Skip => {
                    tracing::debug!(symbol = series.symbol(), period = %period, "skipping partial history");
                    return None;
                }
                HistoryPolicy::Nan => {
                    return Some(MetricRow::undefined(series.symbol(), period, start, end));
                }
                HistoryPolicy::Partial => {}
            }
        }

        let slice = series.slice(start, end);
        let stats = match SliceStatistics::compute(&slice, self.config.risk_free_rate) {
            Ok(stats) => stats,
            Err(err) => {
                tracing::debug!(period = %period, "{err}");
                return match policy {
                    HistoryPolicy::Skip => None,
                    HistoryPolicy::Nan | HistoryPolicy::Partial => {
                        Some(MetricRow::undefined(series.symbol(), period, start, end))
                    }
                };
            }
        };

        let (first, last) = (slice.first_date()?, slice.last_date()?);
        let benchmark_return = total_return(&benchmark.slice(first, last).closes());

        Some(MetricRow {
            symbol: series.symbol().to_string(),
            period: period.label.clone(),
            start: first,
            end: last,
            observations: stats.observations,
            full_history,
            total_return: stats.total_return,
            annualized_return: stats.annualized_return,
            volatility: stats.volatility,
            sharpe_ratio: stats.sharpe_ratio,
            sortino_ratio: stats.sortino_ratio,
            relative_return: stats.total_return - benchmark_return,
        })
    }
}
