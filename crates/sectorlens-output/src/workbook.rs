//! The `metrics.xlsx` workbook.

use crate::report::{MetricsReport, ReportError};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use sectorlens_risk::{MetricRow, RollingCorrelationSeries};
use std::collections::HashMap;
use std::path::Path;

/// Sheet holding every row.
pub const ALL_SHEET: &str = "All";

/// Sheet holding the latest rolling correlation per instrument.
pub const CORRELATION_SHEET: &str = "Rolling Correlation";

const METRIC_HEADERS: [&str; 13] = [
    "Symbol",
    "Name",
    "Period",
    "Start",
    "End",
    "Observations",
    "Full History",
    "Total Return",
    "Annualized Return",
    "Volatility",
    "Sharpe Ratio",
    "Sortino Ratio",
    "Relative Return vs Benchmark",
];

const CORRELATION_HEADERS: [&str; 6] = ["Symbol", "Name", "Benchmark", "Window", "Date", "Correlation"];

/// Excel sheet names are at most 31 characters and exclude `[]:*?/\`.
pub fn sheet_name(label: &str) -> String {
    let cleaned: String = label
        .chars()
        .map(|c| if "[]:*?/\\".contains(c) { '_' } else { c })
        .take(31)
        .collect();
    let reserved = [ALL_SHEET, CORRELATION_SHEET]
        .iter()
        .any(|name| cleaned.eq_ignore_ascii_case(name));
    if cleaned.is_empty() || reserved {
        format!("Period {cleaned}").chars().take(31).collect()
    } else {
        cleaned
    }
}

/// The first two period labels that would land on the same sheet.
///
/// Excel compares sheet names without regard to case, after truncation.
pub fn sheet_name_clash<'a, I>(labels: I) -> Option<(&'a str, &'a str)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen: HashMap<String, &'a str> = HashMap::new();
    for label in labels {
        if let Some(first) = seen.insert(sheet_name(label).to_lowercase(), label) {
            return Some((first, label));
        }
    }
    None
}

struct Formats {
    header: Format,
    percent: Format,
    ratio: Format,
}

impl Formats {
    fn new() -> Self {
        Self {
            header: Format::new().set_bold(),
            percent: Format::new().set_num_format("0.00%"),
            ratio: Format::new().set_num_format("0.000"),
        }
    }
}

/// Writes the metrics workbook.
#[derive(Debug)]
pub struct WorkbookWriter<'a> {
    report: &'a MetricsReport,
    correlations: &'a [RollingCorrelationSeries],
}

impl<'a> WorkbookWriter<'a> {
    /// Create a writer over a report and its rolling correlations.
    pub const fn new(report: &'a MetricsReport, correlations: &'a [RollingCorrelationSeries]) -> Self {
        Self {
            report,
            correlations,
        }
    }

    /// Save the workbook to `path`.
    pub fn save(&self, path: &Path) -> Result<(), ReportError> {
        let mut workbook = self.build()?;
        workbook.save(path)?;
        tracing::debug!(path = %path.display(), "workbook written");
        Ok(())
    }

    /// Serialize the workbook to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ReportError> {
        let mut workbook = self.build()?;
        Ok(workbook.save_to_buffer()?)
    }

    fn build(&self) -> Result<Workbook, ReportError> {
        let formats = Formats::new();
        let mut workbook = Workbook::new();

        for period in self.report.periods() {
            let sheet = workbook.add_worksheet();
            sheet.set_name(sheet_name(period))?;
            self.write_metrics(sheet, &self.report.period_view(period), &formats)?;
        }

        let sheet = workbook.add_worksheet();
        sheet.set_name(ALL_SHEET)?;
        self.write_metrics(sheet, &self.report.all_view(), &formats)?;

        let sheet = workbook.add_worksheet();
        sheet.set_name(CORRELATION_SHEET)?;
        self.write_correlations(sheet, &formats)?;

        Ok(workbook)
    }

    fn write_metrics(
        &self,
        sheet: &mut Worksheet,
        rows: &[&MetricRow],
        formats: &Formats,
    ) -> Result<(), ReportError> {
        write_header(sheet, &METRIC_HEADERS, formats)?;

        for (i, row) in rows.iter().enumerate() {
            let r = i as u32 + 1;
            sheet.write_string(r, 0, &row.symbol)?;
            sheet.write_string(r, 1, self.report.name_of(&row.symbol))?;
            sheet.write_string(r, 2, &row.period)?;
            sheet.write_string(r, 3, row.start.to_string())?;
            sheet.write_string(r, 4, row.end.to_string())?;
            sheet.write_number(r, 5, row.observations as f64)?;
            sheet.write_boolean(r, 6, row.full_history)?;
            write_value(sheet, r, 7, row.total_return, &formats.percent)?;
            write_value(sheet, r, 8, row.annualized_return, &formats.percent)?;
            write_value(sheet, r, 9, row.volatility, &formats.percent)?;
            write_value(sheet, r, 10, row.sharpe_ratio, &formats.ratio)?;
            write_value(sheet, r, 11, row.sortino_ratio, &formats.ratio)?;
            write_value(sheet, r, 12, row.relative_return, &formats.percent)?;
        }

        sheet.set_column_width(1, 24)?;
        sheet.set_column_width(12, 28)?;
        Ok(())
    }

    fn write_correlations(&self, sheet: &mut Worksheet, formats: &Formats) -> Result<(), ReportError> {
        write_header(sheet, &CORRELATION_HEADERS, formats)?;

        let mut r = 1;
        for series in self.correlations {
            let Some(latest) = series.points.last() else {
                continue;
            };
            sheet.write_string(r, 0, &series.symbol)?;
            sheet.write_string(r, 1, self.report.name_of(&series.symbol))?;
            sheet.write_string(r, 2, &series.benchmark)?;
            sheet.write_number(r, 3, series.window as f64)?;
            sheet.write_string(r, 4, latest.date.to_string())?;
            write_value(sheet, r, 5, latest.value, &formats.ratio)?;
            r += 1;
        }

        sheet.set_column_width(1, 24)?;
        Ok(())
    }
}

fn write_header(sheet: &mut Worksheet, headers: &[&str], formats: &Formats) -> Result<(), ReportError> {
    for (col, title) in headers.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, &formats.header)?;
    }
    sheet.set_freeze_panes(1, 0)?;
    Ok(())
}

/// Numbers with a format; NaN as the text "NaN".
fn write_value(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: f64,
    format: &Format,
) -> Result<(), ReportError> {
    if value.is_finite() {
        sheet.write_number_with_format(row, col, value, format)?;
    } else {
        sheet.write_string(row, col, "NaN")?;
    }
    Ok(())
}
