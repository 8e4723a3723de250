//! Metrics over a synthetic two-year history with known values.

use approx::assert_relative_eq;
use chrono::{Duration, NaiveDate};
use sectorlens_data::{PricePanel, PricePoint, PriceSeries};
use sectorlens_risk::returns::{compounded_return, simple_returns};
use sectorlens_risk::{
    CorrelationMatrix, HistoryPolicy, MetricsConfig, MetricsEngine, Period,
    RollingCorrelationSeries,
};

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 1, 1).unwrap()
}

/// ETF alternating +1% / -0.5% a day, benchmark compounding 0.05% a day.
fn synthetic() -> (PriceSeries, PriceSeries) {
    let mut etf = vec![PricePoint::new(start(), 100.0)];
    let mut bench = vec![PricePoint::new(start(), 100.0)];
    for i in 1..=730 {
        let date = start() + Duration::days(i);
        let etf_step = if i % 2 == 1 { 1.01 } else { 0.995 };
        etf.push(PricePoint::new(date, etf[etf.len() - 1].close * etf_step));
        bench.push(PricePoint::new(date, bench[bench.len() - 1].close * 1.0005));
    }
    (
        PriceSeries::from_points("XLK", etf),
        PriceSeries::from_points("^GSPC", bench),
    )
}

#[test]
fn test_one_year_metrics_match_hand_computed_values() {
    let (etf, bench) = synthetic();
    let panel = PricePanel::align(&[etf, bench]).unwrap();
    let engine = MetricsEngine::new(vec![Period::new("1Y", 1)], MetricsConfig::default());

    let rows = engine.compute(&panel, "^GSPC").unwrap();
    let xlk = rows.iter().find(|r| r.symbol == "XLK").unwrap();

    assert_eq!(xlk.start, NaiveDate::from_ymd_opt(2022, 1, 1).unwrap());
    assert_eq!(xlk.end, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
    assert_eq!(xlk.observations, 366);
    assert!(xlk.full_history);
    assert_relative_eq!(xlk.total_return, 1.4441, epsilon = 1e-4);
    assert_relative_eq!(xlk.annualized_return, 1.4456, epsilon = 1e-4);
    assert_relative_eq!(xlk.volatility, 0.1192, epsilon = 1e-4);
    assert_relative_eq!(xlk.sharpe_ratio, 12.1250, epsilon = 1e-4);
    assert_relative_eq!(xlk.relative_return, 1.2439, epsilon = 1e-4);
    // every losing day is identical, so there is no downside dispersion
    assert!(xlk.sortino_ratio.is_nan());

    let gspc = rows.iter().find(|r| r.symbol == "^GSPC").unwrap();
    assert_relative_eq!(gspc.total_return, 0.2002, epsilon = 1e-4);
    assert!(gspc.sharpe_ratio.is_nan());
    assert_eq!(gspc.relative_return, 0.0);
}

#[test]
fn test_total_return_agrees_with_compounded_daily_returns() {
    let (etf, _) = synthetic();
    let prices = etf.closes();
    let compounded = compounded_return(&simple_returns(&prices));
    assert_relative_eq!(compounded, prices[prices.len() - 1] / prices[0] - 1.0, epsilon = 1e-9);
}

#[test]
fn test_longer_period_than_history_is_partial() {
    let (etf, bench) = synthetic();
    let panel = PricePanel::align(&[etf, bench]).unwrap();

    let partial = MetricsEngine::new(vec![Period::new("5Y", 5)], MetricsConfig::default())
        .compute(&panel, "^GSPC")
        .unwrap();
    assert_eq!(partial.len(), 2);
    assert!(partial.iter().all(|r| !r.full_history && r.observations == 731));

    let skipped = MetricsEngine::new(
        vec![Period::new("5Y", 5)],
        MetricsConfig {
            history_policy: HistoryPolicy::Skip,
            ..Default::default()
        },
    )
    .compute(&panel, "^GSPC")
    .unwrap();
    assert!(skipped.is_empty());
}

#[test]
fn test_correlation_outputs_on_panel() {
    let (etf, bench) = synthetic();
    let panel = PricePanel::align(&[etf, bench]).unwrap();

    let rolling = RollingCorrelationSeries::compute(
        &panel.series("XLK").unwrap(),
        &panel.series("^GSPC").unwrap(),
        60,
    )
    .unwrap();
    assert_eq!(rolling.points.len(), panel.len() - 59);

    let matrix = CorrelationMatrix::from_panel(&panel);
    assert_eq!(matrix.symbols(), &["XLK".to_string(), "^GSPC".to_string()]);
    // constant benchmark returns have no variance
    assert!(matrix.get("XLK", "^GSPC").unwrap().is_nan());
}
