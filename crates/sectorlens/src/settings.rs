//! Run configuration.
//!
//! Settings are layered with the `config` crate: built-in defaults, then an
//! optional `sectorlens.toml` in the working directory, then environment
//! variables such as `SECTORLENS__ANALYSIS__ROLLING_WINDOW=90`.

use crate::universe::SectorUniverse;
use chrono::{NaiveDate, Utc};
use sectorlens_data::yahoo::PriceField;
use sectorlens_output::SortKey;
use sectorlens_output::workbook::sheet_name_clash;
use sectorlens_risk::{HistoryPolicy, MetricsConfig, Period};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Base name of the optional settings file.
pub const SETTINGS_FILE: &str = "sectorlens";

/// Prefix of settings environment variables.
pub const ENV_PREFIX: &str = "SECTORLENS";

/// Errors while loading settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// A source could not be read or deserialized.
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// The merged settings are inconsistent.
    #[error("Configuration validation error: {0}")]
    Validation(String),
}

/// Instruments to fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UniverseSettings {
    /// Sector ETF tickers.
    pub sectors: Vec<String>,
    /// Benchmark index ticker.
    pub benchmark: String,
    /// Volatility index ticker; empty to disable.
    pub volatility_index: String,
}

impl Default for UniverseSettings {
    fn default() -> Self {
        Self {
            sectors: crate::universe::GicsSector::all()
                .iter()
                .map(|s| s.etf().to_string())
                .collect(),
            benchmark: "^GSPC".to_string(),
            volatility_index: "^VIX".to_string(),
        }
    }
}

/// Requested date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeSettings {
    /// First date to fetch.
    pub start_date: NaiveDate,
    /// Last date to fetch; today when unset.
    pub end_date: Option<NaiveDate>,
}

impl Default for RangeSettings {
    fn default() -> Self {
        Self {
            start_date: NaiveDate::from_ymd_opt(2013, 1, 1).unwrap_or(NaiveDate::MIN),
            end_date: None,
        }
    }
}

impl RangeSettings {
    /// The configured end date, or `today` when unset.
    pub fn end_or(&self, today: NaiveDate) -> NaiveDate {
        self.end_date.unwrap_or(today)
    }
}

/// Statistics parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Rolling correlation window in trading days.
    pub rolling_window: usize,
    /// Lookback periods in report order.
    pub periods: Vec<Period>,
    /// Annual risk-free rate.
    pub risk_free_rate: f64,
    /// Treatment of instruments with partial history.
    pub history_policy: HistoryPolicy,
    /// Slack in calendar days when deciding full history.
    pub history_tolerance_days: u32,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        let metrics = MetricsConfig::default();
        Self {
            rolling_window: 60,
            periods: Period::defaults(),
            risk_free_rate: metrics.risk_free_rate,
            history_policy: metrics.history_policy,
            history_tolerance_days: metrics.history_tolerance_days,
        }
    }
}

impl AnalysisSettings {
    /// Configuration for the metrics engine.
    pub const fn metrics_config(&self) -> MetricsConfig {
        MetricsConfig {
            risk_free_rate: self.risk_free_rate,
            history_policy: self.history_policy,
            history_tolerance_days: self.history_tolerance_days,
        }
    }
}

/// Where and how results are written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Directory holding the timestamped run directories.
    pub root: PathBuf,
    /// Row order of per-period tables.
    pub sort_key: SortKey,
    /// Chart width in pixels.
    pub chart_width: u32,
    /// Chart height in pixels.
    pub chart_height: u32,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("results"),
            sort_key: SortKey::default(),
            chart_width: 1200,
            chart_height: 800,
        }
    }
}

/// Data source options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    /// Use dividend/split adjusted closes.
    pub use_adjusted_close: bool,
    /// Pause after each request in milliseconds.
    pub request_delay_ms: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            use_adjusted_close: true,
            request_delay_ms: 250,
        }
    }
}

impl FetchSettings {
    /// Quote column to read prices from.
    pub const fn price_field(&self) -> PriceField {
        if self.use_adjusted_close {
            PriceField::AdjustedClose
        } else {
            PriceField::Close
        }
    }
}

/// All settings of a run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Instruments.
    pub universe: UniverseSettings,
    /// Date range.
    pub range: RangeSettings,
    /// Statistics parameters.
    pub analysis: AnalysisSettings,
    /// Output options.
    pub output: OutputSettings,
    /// Data source options.
    pub fetch: FetchSettings,
}

impl Settings {
    /// Load defaults, `sectorlens.toml` if present and `SECTORLENS__*`
    /// environment variables, then validate.
    pub fn load() -> Result<Self, SettingsError> {
        Self::load_with(config::File::with_name(SETTINGS_FILE).required(false))
    }

    /// Like [`Settings::load`] with an explicit settings file.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        Self::load_with(config::File::from(path))
    }

    fn load_with<S>(file: S) -> Result<Self, SettingsError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&Self::default())?)
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("universe.sectors"),
            )
            .build()?
            .try_deserialize::<Self>()?;

        settings.validate(Utc::now().date_naive())?;
        Ok(settings)
    }

    /// Check the settings against each other, with `today` standing in for
    /// an unset end date.
    pub fn validate(&self, today: NaiveDate) -> Result<(), SettingsError> {
        let invalid = |msg: String| Err(SettingsError::Validation(msg));

        if self.universe.benchmark.trim().is_empty() {
            return invalid("universe.benchmark must not be empty".to_string());
        }

        let end = self.range.end_or(today);
        if self.range.start_date >= end {
            return invalid(format!(
                "range.start_date {} must be before the end date {end}",
                self.range.start_date
            ));
        }

        if self.analysis.rolling_window < 2 {
            return invalid(format!(
                "analysis.rolling_window must be at least 2, got {}",
                self.analysis.rolling_window
            ));
        }

        if self.analysis.periods.is_empty() {
            return invalid("analysis.periods must name at least one period".to_string());
        }
        let mut labels = HashSet::new();
        for period in &self.analysis.periods {
            if period.label.trim().is_empty() {
                return invalid("analysis.periods labels must not be empty".to_string());
            }
            if period.years == 0 {
                return invalid(format!("period {} must span at least one year", period.label));
            }
            if !labels.insert(period.label.as_str()) {
                return invalid(format!("period label {} is used twice", period.label));
            }
        }
        if let Some((first, second)) =
            sheet_name_clash(self.analysis.periods.iter().map(|p| p.label.as_str()))
        {
            return invalid(format!(
                "period labels {first} and {second} would share a workbook sheet"
            ));
        }

        if !self.analysis.risk_free_rate.is_finite() {
            return invalid("analysis.risk_free_rate must be finite".to_string());
        }

        if self.output.chart_width < 200 || self.output.chart_height < 200 {
            return invalid(format!(
                "charts must be at least 200x200 pixels, got {}x{}",
                self.output.chart_width, self.output.chart_height
            ));
        }

        Ok(())
    }

    /// The instrument universe described by these settings.
    pub fn universe(&self) -> SectorUniverse {
        SectorUniverse::new(
            &self.universe.sectors,
            &self.universe.benchmark,
            &self.universe.volatility_index,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 28).unwrap()
    }

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        settings.validate(today()).unwrap();

        assert_eq!(settings.universe.sectors.len(), 11);
        assert_eq!(settings.analysis.rolling_window, 60);
        assert_eq!(settings.analysis.periods, Period::defaults());
        assert_eq!(settings.output.sort_key, SortKey::SharpeDesc);
        assert_eq!(settings.fetch.price_field(), PriceField::AdjustedClose);
        assert_eq!(settings.range.end_or(today()), today());
    }

    #[rstest]
    #[case::window(|s: &mut Settings| s.analysis.rolling_window = 1)]
    #[case::no_periods(|s: &mut Settings| s.analysis.periods.clear())]
    #[case::zero_years(|s: &mut Settings| s.analysis.periods.push(Period::new("0Y", 0)))]
    #[case::duplicate(|s: &mut Settings| s.analysis.periods.push(Period::new("5Y", 5)))]
    #[case::sheet_case(|s: &mut Settings| s.analysis.periods.push(Period::new("5y", 5)))]
    #[case::sheet_truncation(|s: &mut Settings| {
        s.analysis.periods = vec![
            Period::new("Trailing twelve months ending June A", 1),
            Period::new("Trailing twelve months ending June B", 1),
        ];
    })]
    #[case::benchmark(|s: &mut Settings| s.universe.benchmark = String::new())]
    #[case::range(|s: &mut Settings| s.range.end_date = NaiveDate::from_ymd_opt(2012, 1, 1))]
    #[case::chart(|s: &mut Settings| s.output.chart_height = 100)]
    fn test_validation_rejects(#[case] tweak: fn(&mut Settings)) {
        let mut settings = Settings::default();
        tweak(&mut settings);
        assert!(matches!(
            settings.validate(today()),
            Err(SettingsError::Validation(_))
        ));
    }

    #[test]
    fn test_reserved_sheet_labels() {
        let mut settings = Settings::default();
        settings.analysis.periods = vec![Period::new("all", 1), Period::new("ALL", 2)];
        // both become "Period all" ignoring case
        assert!(settings.validate(today()).is_err());

        settings.analysis.periods = vec![Period::new("all", 1), Period::new("3Y", 3)];
        settings.validate(today()).unwrap();
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[universe]
sectors = ["XLK", "XLE"]
volatility_index = ""

[range]
start_date = "2020-01-01"
end_date = "2024-06-28"

[analysis]
rolling_window = 20
history_policy = "skip"
periods = [{{ label = "2Y", years = 2 }}, {{ label = "1Y", years = 1 }}]

[output]
sort_key = "total_return_desc"
"#
        )
        .unwrap();

        let settings = Settings::load_from(file.path()).unwrap();
        assert_eq!(settings.universe.sectors, vec!["XLK", "XLE"]);
        assert_eq!(settings.universe.benchmark, "^GSPC");
        assert_eq!(settings.range.end_date, NaiveDate::from_ymd_opt(2024, 6, 28));
        assert_eq!(settings.analysis.rolling_window, 20);
        assert_eq!(settings.analysis.history_policy, HistoryPolicy::Skip);
        assert_eq!(settings.analysis.periods[0], Period::new("2Y", 2));
        assert_eq!(settings.output.sort_key, SortKey::TotalReturnDesc);
        assert_eq!(settings.output.chart_width, 1200);

        let universe = settings.universe();
        assert_eq!(universe.instruments().len(), 3);
    }

    #[test]
    fn test_load_from_file_validates() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[analysis]\nrolling_window = 1").unwrap();

        assert!(matches!(
            Settings::load_from(file.path()),
            Err(SettingsError::Validation(_))
        ));
    }
}
