//! End-to-end run: fetch, align, compute, write.
//!
//! Every stage after the fetch is a pure function of the fetched series and
//! the settings. A symbol that cannot be fetched is skipped with a warning;
//! only a missing benchmark, no data at all or an unwritable output
//! directory end the run. The run directory is created once the fetched data
//! is known to be usable. Charts are best effort.

use crate::settings::{Settings, SettingsError};
use crate::universe::{SectorUniverse, Universe};
use chrono::{DateTime, Local, NaiveDate, Utc};
use indicatif::ProgressBar;
use sectorlens_data::{PricePanel, PriceSeries, PriceSource};
use sectorlens_output::charts::{
    cumulative_return_lines, relative_performance_lines, rolling_correlation_lines,
};
use sectorlens_output::{
    ChartError, ChartRenderer, CorrelationRecord, ExportError, ExportFormat, Exporter,
    FailedSymbol, MetricRecord, MetricsReport, ReportError, RunReport, WorkbookWriter,
    summary_tables,
};
use sectorlens_risk::{CorrelationMatrix, MetricsEngine, RiskError, RollingCorrelationSeries};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Spreadsheet file name.
pub const WORKBOOK_FILE: &str = "metrics.xlsx";
/// Metrics CSV file name.
pub const METRICS_CSV_FILE: &str = "metrics.csv";
/// Rolling correlation CSV file name.
pub const CORRELATION_CSV_FILE: &str = "rolling_correlation.csv";
/// Run report file name.
pub const REPORT_FILE: &str = "report.json";

/// Fatal run errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Settings could not be loaded.
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// The run directory could not be created.
    #[error("Cannot write to {path}: {source}")]
    FileWrite {
        /// Offending path
        path: PathBuf,
        /// Underlying IO error
        source: io::Error,
    },

    /// No instrument returned any prices.
    #[error("No price data could be fetched for any instrument")]
    NoData,

    /// The benchmark could not be fetched.
    #[error("Benchmark {0} could not be fetched; relative metrics are undefined")]
    MissingBenchmark(String),

    /// Writing the spreadsheet or run report failed.
    #[error(transparent)]
    Report(#[from] ReportError),

    /// Writing a CSV export failed.
    #[error(transparent)]
    Export(#[from] ExportError),

    /// A statistic could not be computed.
    #[error(transparent)]
    Risk(#[from] RiskError),
}

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// The run directory.
    pub output_dir: PathBuf,
    /// File names written into the run directory.
    pub artifacts: Vec<String>,
    /// Symbols with data.
    pub fetched: Vec<String>,
    /// Symbols that were skipped.
    pub failed: Vec<FailedSymbol>,
    /// End date of every period.
    pub latest_common_date: Option<NaiveDate>,
    /// Number of metric rows.
    pub metric_rows: usize,
}

/// Series that could be fetched and the symbols that could not.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    /// Non-empty series in universe order.
    pub series: Vec<PriceSeries>,
    /// Skipped symbols with reasons.
    pub failed: Vec<FailedSymbol>,
}

/// Fetch every instrument one after another, skipping failures.
pub async fn fetch_universe<S: PriceSource>(
    source: &S,
    universe: &SectorUniverse,
    start: NaiveDate,
    end: NaiveDate,
    progress: Option<&ProgressBar>,
) -> FetchOutcome {
    let mut outcome = FetchOutcome::default();

    if let Some(pb) = progress {
        pb.set_length(universe.size() as u64);
        pb.set_message("Fetching prices...");
    }

    for instrument in universe.instruments() {
        let symbol = instrument.symbol.as_str();
        if let Some(pb) = progress {
            pb.set_message(format!("Fetching {symbol}"));
        }

        match source.fetch_history(symbol, start, end).await {
            Ok(series) if !series.is_empty() => {
                tracing::debug!(symbol, observations = series.len(), "fetched");
                outcome.series.push(series);
            }
            Ok(_) => skip(&mut outcome, symbol, "no prices in range".to_string(), progress),
            Err(e) => skip(&mut outcome, symbol, e.to_string(), progress),
        }

        if let Some(pb) = progress {
            pb.inc(1);
        }
    }

    outcome
}

fn skip(outcome: &mut FetchOutcome, symbol: &str, reason: String, progress: Option<&ProgressBar>) {
    let warn = || tracing::warn!(symbol, %reason, "skipping instrument");
    match progress {
        Some(pb) => pb.suspend(warn),
        None => warn(),
    }
    outcome.failed.push(FailedSymbol {
        symbol: symbol.to_string(),
        reason,
    });
}

/// Create `root/<YYYYMMDD_HHMMSS>`, appending `_1`, `_2`, ... when taken.
pub fn create_run_dir(root: &Path, now: DateTime<Local>) -> Result<PathBuf, PipelineError> {
    let file_error = |path: &Path, source: io::Error| PipelineError::FileWrite {
        path: path.to_path_buf(),
        source,
    };

    fs::create_dir_all(root).map_err(|e| file_error(root, e))?;

    let stamp = now.format("%Y%m%d_%H%M%S").to_string();
    let mut suffix = 0u32;
    loop {
        let name = if suffix == 0 {
            stamp.clone()
        } else {
            format!("{stamp}_{suffix}")
        };
        let candidate = root.join(name);
        match fs::create_dir(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => suffix += 1,
            Err(e) => return Err(file_error(&candidate, e)),
        }
    }
}

/// Series whose price level reads as a return; the volatility index is left out.
fn investable_series(universe: &SectorUniverse, series: &[PriceSeries]) -> Vec<PriceSeries> {
    series
        .iter()
        .filter(|s| universe.get(s.symbol()).is_none_or(|i| i.is_investable()))
        .cloned()
        .collect()
}

/// Characters safe in a file name; everything else becomes `_`.
fn file_stem(label: &str) -> String {
    label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

/// A configured analysis run over a price source.
#[derive(Debug)]
pub struct Pipeline<S> {
    settings: Settings,
    source: S,
}

impl<S: PriceSource> Pipeline<S> {
    /// Create a pipeline.
    pub const fn new(settings: Settings, source: S) -> Self {
        Self { settings, source }
    }

    /// The run's settings.
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Run end to end, writing into a fresh timestamped directory.
    pub async fn run(&self, progress: Option<&ProgressBar>) -> Result<RunSummary, PipelineError> {
        let settings = &self.settings;
        let start = settings.range.start_date;
        let end = settings.range.end_or(Utc::now().date_naive());
        let universe = settings.universe();
        let benchmark = settings.universe.benchmark.clone();

        tracing::info!(%start, %end, instruments = universe.size(), "starting run");

        let fetched = fetch_universe(&self.source, &universe, start, end, progress).await;
        if let Some(pb) = progress {
            pb.finish_and_clear();
        }
        if fetched.series.is_empty() {
            return Err(PipelineError::NoData);
        }
        if !fetched.series.iter().any(|s| s.symbol() == benchmark) {
            return Err(PipelineError::MissingBenchmark(benchmark));
        }
        tracing::info!(
            fetched = fetched.series.len(),
            failed = fetched.failed.len(),
            "price data ready"
        );

        let output_dir = create_run_dir(&settings.output.root, Local::now())?;
        tracing::info!(dir = %output_dir.display(), "writing results");

        let panel = PricePanel::align(&fetched.series).map_err(|_| PipelineError::NoData)?;
        let latest_common_date = panel.end_date();
        let Some(benchmark_series) = panel.series(&benchmark) else {
            return Err(PipelineError::MissingBenchmark(benchmark));
        };

        let engine = MetricsEngine::new(
            settings.analysis.periods.clone(),
            settings.analysis.metrics_config(),
        );
        let rows = engine.compute(&panel, &benchmark)?;

        let aligned: Vec<PriceSeries> = panel
            .symbols()
            .into_iter()
            .filter_map(|symbol| panel.series(symbol))
            .collect();

        let rolling = aligned
            .iter()
            .filter(|s| s.symbol() != benchmark)
            .map(|s| {
                RollingCorrelationSeries::compute(s, &benchmark_series, settings.analysis.rolling_window)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let names: HashMap<String, String> = universe
            .instruments()
            .iter()
            .map(|i| (i.symbol.clone(), i.name.clone()))
            .collect();
        let labels: Vec<String> = settings
            .analysis
            .periods
            .iter()
            .map(|p| p.label.clone())
            .collect();
        let metric_rows = rows.len();
        let report = MetricsReport::new(rows, labels, settings.output.sort_key).with_names(names);

        for table in summary_tables(&report) {
            tracing::info!("{table}");
        }

        let mut artifacts = Vec::new();

        WorkbookWriter::new(&report, &rolling).save(&output_dir.join(WORKBOOK_FILE))?;
        artifacts.push(WORKBOOK_FILE.to_string());

        MetricRecord::from_report(&report)
            .export_to_file(&output_dir.join(METRICS_CSV_FILE), ExportFormat::Csv)?;
        artifacts.push(METRICS_CSV_FILE.to_string());

        CorrelationRecord::from_series(&rolling)
            .export_to_file(&output_dir.join(CORRELATION_CSV_FILE), ExportFormat::Csv)?;
        artifacts.push(CORRELATION_CSV_FILE.to_string());

        let investable = investable_series(&universe, &aligned);
        let renderer = ChartRenderer::new(settings.output.chart_width, settings.output.chart_height);
        let mut chart = |name: String, draw: &dyn Fn(&Path) -> Result<(), ChartError>| {
            match draw(&output_dir.join(&name)) {
                Ok(()) => artifacts.push(name),
                Err(e) => tracing::warn!(chart = %name, error = %e, "chart skipped"),
            }
        };

        let lines = cumulative_return_lines(&investable);
        chart("cumulative_returns.png".to_string(), &|path: &Path| {
            renderer.line_chart(path, "Cumulative Returns", "Cumulative return", &lines)
        });

        let lines = rolling_correlation_lines(&rolling);
        let title = format!(
            "{}-Day Rolling Correlation with {benchmark}",
            settings.analysis.rolling_window
        );
        chart("rolling_correlation.png".to_string(), &|path: &Path| {
            renderer.line_chart(path, &title, "Correlation", &lines)
        });

        let lines = relative_performance_lines(&investable, &benchmark_series);
        let title = format!("Performance Relative to {benchmark}");
        chart("relative_performance.png".to_string(), &|path: &Path| {
            renderer.line_chart(path, &title, "Cumulative excess return", &lines)
        });

        let matrix = CorrelationMatrix::from_panel(&panel);
        chart("correlation_heatmap_full.png".to_string(), &|path: &Path| {
            renderer.heatmap(path, "Return Correlation (Full Range)", &matrix)
        });

        if let Some(end_date) = latest_common_date {
            for period in &settings.analysis.periods {
                let matrix = CorrelationMatrix::from_panel(&panel.since(period.start_for(end_date)));
                let title = format!("Return Correlation ({period})");
                chart(
                    format!("correlation_heatmap_{}.png", file_stem(&period.label)),
                    &|path: &Path| renderer.heatmap(path, &title, &matrix),
                );
            }
        }

        artifacts.push(REPORT_FILE.to_string());
        let run_report = RunReport {
            latest_common_date,
            fetched: fetched.series.iter().map(|s| s.symbol().to_string()).collect(),
            failed: fetched.failed.clone(),
            integrity_issues: fetched
                .series
                .iter()
                .filter_map(PriceSeries::validation)
                .filter(|v| !v.is_clean())
                .cloned()
                .collect(),
            artifacts: artifacts.clone(),
            metrics: report.all_view().into_iter().cloned().collect(),
            ..RunReport::new(start, end, benchmark.as_str())
        };
        run_report.write_to(&output_dir.join(REPORT_FILE))?;

        tracing::info!(
            dir = %output_dir.display(),
            files = artifacts.len(),
            "run complete"
        );

        Ok(RunSummary {
            output_dir,
            artifacts,
            fetched: run_report.fetched,
            failed: fetched.failed,
            latest_common_date,
            metric_rows,
        })
    }
}
