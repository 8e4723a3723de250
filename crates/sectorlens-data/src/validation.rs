//! Integrity checks on raw provider data.
//!
//! Problems are reported and logged but never fatal: [`PriceSeries::from_points`]
//! repairs what it can (ordering, duplicates, unusable prices). The report
//! travels with the fetched series so the run report can list it.
//!
//! [`PriceSeries::from_points`]: crate::PriceSeries::from_points

use crate::series::PricePoint;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Issues found in one symbol's raw price points.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Symbol that was checked.
    pub symbol: String,
    /// Number of raw points.
    pub observations: usize,
    /// Points whose date already appeared earlier.
    pub duplicate_dates: usize,
    /// Points with a non-finite or non-positive price.
    pub invalid_prices: usize,
    /// Points dated before their predecessor.
    pub out_of_order: usize,
}

impl ValidationReport {
    /// Whether no issue was found.
    pub const fn is_clean(&self) -> bool {
        self.duplicate_dates == 0 && self.invalid_prices == 0 && self.out_of_order == 0
    }
}

/// Check raw points for duplicates, unusable prices and ordering problems.
pub fn validate_points(symbol: &str, points: &[PricePoint]) -> ValidationReport {
    let mut seen = HashSet::with_capacity(points.len());
    let mut report = ValidationReport {
        symbol: symbol.to_string(),
        observations: points.len(),
        ..Default::default()
    };

    for (idx, point) in points.iter().enumerate() {
        if !seen.insert(point.date) {
            report.duplicate_dates += 1;
        }
        if !point.close.is_finite() || point.close <= 0.0 {
            report.invalid_prices += 1;
        }
        if idx > 0 && point.date < points[idx - 1].date {
            report.out_of_order += 1;
        }
    }

    if report.is_clean() {
        tracing::debug!(symbol, observations = report.observations, "validation passed");
    } else {
        tracing::warn!(
            symbol,
            duplicate_dates = report.duplicate_dates,
            invalid_prices = report.invalid_prices,
            out_of_order = report.out_of_order,
            "price data has integrity issues"
        );
    }

    report
}
