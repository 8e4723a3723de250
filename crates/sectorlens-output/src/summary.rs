//! Plain-text summary tables for the console.

use crate::report::MetricsReport;
use sectorlens_risk::MetricRow;
use std::fmt::Write;

const RULE_WIDTH: usize = 96;

/// Format a fraction as a percentage; NaN stays NaN.
fn pct(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else {
        format!("{:.2}%", value * 100.0)
    }
}

fn num(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else {
        format!("{value:.3}")
    }
}

/// ASCII table of one period's rows in the report's sort order.
pub fn period_table(report: &MetricsReport, label: &str) -> String {
    let rows = report.period_view(label);
    let mut output = String::new();

    let _ = writeln!(output, "\nSector Metrics: {label}");
    if let (Some(start), Some(end)) = (
        rows.iter().map(|r| r.start).min(),
        rows.iter().map(|r| r.end).max(),
    ) {
        let _ = writeln!(output, "Period: {start} to {end}");
    }
    output.push_str(&"=".repeat(RULE_WIDTH));
    output.push('\n');

    let _ = writeln!(
        output,
        "{:<8} {:>10} {:>10} {:>10} {:>8} {:>8} {:>10}  {:<24}",
        "Symbol", "Total", "Annual", "Vol", "Sharpe", "Sortino", "vs Bench", "Name"
    );
    output.push_str(&"-".repeat(RULE_WIDTH));
    output.push('\n');

    for row in &rows {
        output.push_str(&table_line(row, report.name_of(&row.symbol)));
    }

    output.push_str(&"=".repeat(RULE_WIDTH));
    output.push('\n');

    let partial = rows.iter().filter(|r| !r.full_history).count();
    if partial > 0 {
        let _ = writeln!(output, "{partial} instrument(s) with partial history");
    }

    output
}

fn table_line(row: &MetricRow, name: &str) -> String {
    let marker = if row.full_history { "" } else { "*" };
    format!(
        "{:<8} {:>10} {:>10} {:>10} {:>8} {:>8} {:>10}  {:<24}\n",
        format!("{}{marker}", row.symbol),
        pct(row.total_return),
        pct(row.annualized_return),
        pct(row.volatility),
        num(row.sharpe_ratio),
        num(row.sortino_ratio),
        pct(row.relative_return),
        name
    )
}

/// Tables for every period in report order.
pub fn summary_tables(report: &MetricsReport) -> Vec<String> {
    report
        .periods()
        .iter()
        .map(|label| period_table(report, label))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::SortKey;
    use chrono::NaiveDate;

    fn row(symbol: &str, sharpe: f64, full_history: bool) -> MetricRow {
        MetricRow {
            symbol: symbol.to_string(),
            period: "3Y".to_string(),
            start: NaiveDate::from_ymd_opt(2021, 6, 28).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 6, 28).unwrap(),
            observations: 757,
            full_history,
            total_return: 0.2534,
            annualized_return: 0.0784,
            volatility: 0.1812,
            sharpe_ratio: sharpe,
            sortino_ratio: f64::NAN,
            relative_return: -0.0123,
        }
    }

    #[test]
    fn test_period_table() {
        let report = MetricsReport::new(
            vec![row("XLV", 0.43, true), row("XLC", 0.91, false)],
            vec!["3Y".to_string()],
            SortKey::SharpeDesc,
        );

        let table = period_table(&report, "3Y");
        assert!(table.contains("Sector Metrics: 3Y"));
        assert!(table.contains("Period: 2021-06-28 to 2024-06-28"));
        assert!(table.contains("25.34%"));
        assert!(table.contains("-1.23%"));
        assert!(table.contains("NaN"));
        assert!(table.contains("1 instrument(s) with partial history"));

        // sorted by Sharpe
        let xlc = table.find("XLC*").unwrap();
        let xlv = table.find("XLV").unwrap();
        assert!(xlc < xlv);
    }

    #[test]
    fn test_summary_tables_per_period() {
        let report = MetricsReport::new(
            Vec::new(),
            vec!["5Y".to_string(), "1Y".to_string()],
            SortKey::SharpeDesc,
        );
        let tables = summary_tables(&report);
        assert_eq!(tables.len(), 2);
        assert!(tables[1].contains("Sector Metrics: 1Y"));
    }
}
