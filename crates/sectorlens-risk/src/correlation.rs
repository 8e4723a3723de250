//! Rolling and pairwise correlation of daily returns.

use crate::error::RiskError;
use crate::returns::padded_returns;
use crate::stats::pearson;
use chrono::NaiveDate;
use ndarray::Array2;
use sectorlens_data::{PricePanel, PriceSeries};
use serde::Serialize;

/// Minimum number of overlapping returns for a matrix entry.
pub const MIN_PAIRWISE_OBSERVATIONS: usize = 3;

/// Pearson correlation over each trailing window of `window` points.
///
/// The output has `len - (window - 1)` values (empty when the inputs are
/// shorter than the window); entry `i` covers inputs `i..i + window`.
///
/// # Errors
///
/// Returns [`RiskError::InvalidWindow`] for a window below 2 and
/// [`RiskError::LengthMismatch`] for inputs of different length.
pub fn rolling_correlation(x: &[f64], y: &[f64], window: usize) -> Result<Vec<f64>, RiskError> {
    if window < 2 {
        return Err(RiskError::InvalidWindow(window));
    }
    if x.len() != y.len() {
        return Err(RiskError::LengthMismatch {
            expected: x.len(),
            actual: y.len(),
        });
    }

    Ok(x.windows(window)
        .zip(y.windows(window))
        .map(|(a, b)| pearson(a, b))
        .collect())
}

/// One dated correlation value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CorrelationPoint {
    /// Last date of the window.
    pub date: NaiveDate,
    /// Correlation in `[-1, 1]`, NaN when undefined.
    pub value: f64,
}

/// Rolling correlation of one instrument against the benchmark.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollingCorrelationSeries {
    /// Instrument symbol.
    pub symbol: String,
    /// Benchmark symbol.
    pub benchmark: String,
    /// Window length in trading days.
    pub window: usize,
    /// Values dated by the last day of each window.
    pub points: Vec<CorrelationPoint>,
}

impl RollingCorrelationSeries {
    /// Correlate daily returns of `series` and `benchmark` on their common dates.
    ///
    /// Returns are padded with a leading zero so that every common date has a
    /// return; with `n` common dates there are `n - (window - 1)` points.
    ///
    /// # Errors
    ///
    /// Returns [`RiskError::InvalidWindow`] for a window below 2.
    pub fn compute(
        series: &PriceSeries,
        benchmark: &PriceSeries,
        window: usize,
    ) -> Result<Self, RiskError> {
        let (dates, prices, bench): (Vec<NaiveDate>, Vec<f64>, Vec<f64>) = series
            .points()
            .iter()
            .filter_map(|p| benchmark.close_on(p.date).map(|b| (p.date, p.close, b)))
            .fold(
                (Vec::new(), Vec::new(), Vec::new()),
                |(mut dates, mut prices, mut bench), (date, price, b)| {
                    dates.push(date);
                    prices.push(price);
                    bench.push(b);
                    (dates, prices, bench)
                },
            );

        let values = rolling_correlation(&padded_returns(&prices), &padded_returns(&bench), window)?;
        let points = dates
            .iter()
            .skip(window - 1)
            .zip(values)
            .map(|(date, value)| CorrelationPoint { date: *date, value })
            .collect();

        Ok(Self {
            symbol: series.symbol().to_string(),
            benchmark: benchmark.symbol().to_string(),
            window,
            points,
        })
    }

    /// Whether no window was complete.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Most recent correlation value.
    pub fn latest(&self) -> Option<f64> {
        self.points.last().map(|p| p.value)
    }
}

/// Symmetric matrix of pairwise return correlations.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    symbols: Vec<String>,
    values: Array2<f64>,
}

impl CorrelationMatrix {
    /// Correlations of daily returns between every pair of panel columns.
    ///
    /// Each pair uses the days on which both instruments have a return.
    /// Entries with fewer than [`MIN_PAIRWISE_OBSERVATIONS`] such days, or
    /// with a constant series, are NaN. The diagonal is 1.
    pub fn from_panel(panel: &PricePanel) -> Self {
        let symbols: Vec<String> = panel.symbols().into_iter().map(str::to_string).collect();
        let returns: Vec<Vec<Option<f64>>> = panel
            .columns()
            .iter()
            .map(|column| {
                column
                    .values()
                    .windows(2)
                    .map(|w| match (w[0], w[1]) {
                        (Some(prev), Some(curr)) => Some(curr / prev - 1.0),
                        _ => None,
                    })
                    .collect()
            })
            .collect();

        let n = symbols.len();
        let mut values = Array2::from_elem((n, n), f64::NAN);
        for i in 0..n {
            values[[i, i]] = 1.0;
            for j in (i + 1)..n {
                let (x, y): (Vec<f64>, Vec<f64>) = returns[i]
                    .iter()
                    .zip(&returns[j])
                    .filter_map(|(a, b)| a.zip(*b))
                    .unzip();
                let rho = if x.len() < MIN_PAIRWISE_OBSERVATIONS {
                    f64::NAN
                } else {
                    pearson(&x, &y)
                };
                values[[i, j]] = rho;
                values[[j, i]] = rho;
            }
        }

        Self { symbols, values }
    }

    /// Row and column labels.
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// The raw matrix.
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Number of instruments.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Whether the matrix has no instruments.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Correlation between two symbols.
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.symbols.iter().position(|s| s == a)?;
        let j = self.symbols.iter().position(|s| s == b)?;
        Some(self.values[[i, j]])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::Duration;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use rstest::rstest;
    use sectorlens_data::PricePoint;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
    }

    fn series(symbol: &str, prices: &[f64]) -> PriceSeries {
        PriceSeries::from_points(
            symbol,
            prices
                .iter()
                .enumerate()
                .map(|(i, p)| PricePoint::new(start() + Duration::days(i as i64), *p))
                .collect(),
        )
    }

    fn random_walk(rng: &mut StdRng, len: usize) -> Vec<f64> {
        let mut price = 100.0;
        (0..len)
            .map(|_| {
                price *= 1.0 + rng.gen_range(-0.03..0.03);
                price
            })
            .collect()
    }

    #[rstest]
    #[case(10, 5, 6)]
    #[case(60, 60, 1)]
    #[case(30, 60, 0)]
    fn test_rolling_correlation_length(#[case] len: usize, #[case] window: usize, #[case] expected: usize) {
        let x: Vec<f64> = (0..len).map(|i| (i as f64).sin()).collect();
        let y: Vec<f64> = (0..len).map(|i| (i as f64 * 0.7).cos()).collect();
        assert_eq!(rolling_correlation(&x, &y, window).unwrap().len(), expected);
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    fn test_rolling_correlation_invalid_window(#[case] window: usize) {
        let x = [0.1, 0.2, 0.3];
        assert_eq!(
            rolling_correlation(&x, &x, window).unwrap_err(),
            RiskError::InvalidWindow(window)
        );
    }

    #[test]
    fn test_rolling_correlation_length_mismatch() {
        let result = rolling_correlation(&[0.1, 0.2, 0.3], &[0.1, 0.2], 2);
        assert!(matches!(result, Err(RiskError::LengthMismatch { .. })));
    }

    #[test]
    fn test_rolling_correlation_of_random_walks_is_bounded() {
        let mut rng = StdRng::seed_from_u64(7);
        let a = series("XLF", &random_walk(&mut rng, 300));
        let b = series("^GSPC", &random_walk(&mut rng, 300));

        let rolling = RollingCorrelationSeries::compute(&a, &b, 60).unwrap();
        assert_eq!(rolling.points.len(), 300 - 59);
        assert_eq!(rolling.points[0].date, start() + Duration::days(59));
        assert!(rolling.points.iter().all(|p| (-1.0..=1.0).contains(&p.value)));
    }

    #[test]
    fn test_self_correlation_is_one() {
        let mut rng = StdRng::seed_from_u64(11);
        let a = series("^GSPC", &random_walk(&mut rng, 120));

        let rolling = RollingCorrelationSeries::compute(&a, &a, 20).unwrap();
        for point in &rolling.points {
            assert_relative_eq!(point.value, 1.0, epsilon = 1e-9);
        }
        assert_eq!(rolling.benchmark, "^GSPC");
    }

    #[test]
    fn test_rolling_uses_common_dates() {
        let a = series("XLRE", &[10.0, 10.5, 10.2, 10.8, 11.0, 10.9]);
        // benchmark starts two days later
        let b = PriceSeries::from_points(
            "^GSPC",
            (2..8)
                .map(|i| PricePoint::new(start() + Duration::days(i), 100.0 + i as f64))
                .collect(),
        );

        let rolling = RollingCorrelationSeries::compute(&a, &b, 2).unwrap();
        // common dates are days 2..=5
        assert_eq!(rolling.points.len(), 3);
        assert_eq!(rolling.points[0].date, start() + Duration::days(3));
    }

    #[test]
    fn test_correlation_matrix() {
        let up = series("A", &[100.0, 101.0, 100.5, 102.0, 101.0, 103.0]);
        let same = series("B", &[50.0, 50.5, 50.25, 51.0, 50.5, 51.5]);
        let flat = series("C", &[20.0; 6]);
        let panel = PricePanel::align(&[up, same, flat]).unwrap();

        let matrix = CorrelationMatrix::from_panel(&panel);
        assert_eq!(matrix.len(), 3);
        assert_eq!(matrix.values().dim(), (3, 3));
        assert_relative_eq!(matrix.get("A", "B").unwrap(), 1.0, epsilon = 1e-9);
        assert!(matrix.get("A", "C").unwrap().is_nan());
        assert_eq!(matrix.get("C", "C"), Some(1.0));
        assert_eq!(matrix.get("A", "Z"), None);
    }

    #[test]
    fn test_correlation_matrix_is_symmetric() {
        let mut rng = StdRng::seed_from_u64(3);
        let symbols = ["XLB", "XLE", "XLI", "XLK"];
        let all: Vec<PriceSeries> = symbols
            .iter()
            .map(|s| series(s, &random_walk(&mut rng, 50)))
            .collect();
        let panel = PricePanel::align(&all).unwrap();

        let matrix = CorrelationMatrix::from_panel(&panel);
        let values = matrix.values();
        for i in 0..4 {
            assert_eq!(values[[i, i]], 1.0);
            for j in 0..4 {
                assert_eq!(values[[i, j]], values[[j, i]]);
                assert!((-1.0..=1.0).contains(&values[[i, j]]));
            }
        }
    }

    #[test]
    fn test_correlation_matrix_needs_overlap() {
        let a = series("A", &[1.0, 1.1, 1.2, 1.15, 1.3]);
        // overlaps A on its last two days only
        let b = PriceSeries::from_points(
            "B",
            (3..5)
                .map(|i| PricePoint::new(start() + Duration::days(i), 5.0 + i as f64))
                .collect(),
        );
        let panel = PricePanel::align(&[a, b]).unwrap();

        let matrix = CorrelationMatrix::from_panel(&panel);
        assert!(matrix.get("A", "B").unwrap().is_nan());
    }
}
