//! Daily price series for a single instrument.

use crate::validation::ValidationReport;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single daily observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Trading date.
    pub date: NaiveDate,
    /// Closing (or adjusted closing) price.
    pub close: f64,
}

impl PricePoint {
    /// Create a new price point.
    pub const fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }

    fn is_usable(&self) -> bool {
        self.close.is_finite() && self.close > 0.0
    }
}

/// Date-indexed daily price series.
///
/// Dates are strictly ascending and unique, and every price is finite and
/// positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    symbol: String,
    points: Vec<PricePoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    validation: Option<ValidationReport>,
}

impl PriceSeries {
    /// Build a series from raw provider points.
    ///
    /// Points are sorted by date, unusable prices (non-finite or not
    /// positive) are dropped and for duplicate dates the last point wins.
    pub fn from_points(symbol: impl Into<String>, mut points: Vec<PricePoint>) -> Self {
        points.retain(PricePoint::is_usable);
        // stable sort keeps provider order within a date
        points.sort_by_key(|p| p.date);

        let mut deduped: Vec<PricePoint> = Vec::with_capacity(points.len());
        for point in points {
            match deduped.last_mut() {
                Some(last) if last.date == point.date => *last = point,
                _ => deduped.push(point),
            }
        }

        Self {
            symbol: symbol.into(),
            points: deduped,
            validation: None,
        }
    }

    /// Attach the integrity report of the raw points this series was built from.
    pub fn with_validation(mut self, report: ValidationReport) -> Self {
        self.validation = Some(report);
        self
    }

    /// Integrity report of the raw provider data, if the source produced one.
    ///
    /// Derived series (slices, aligned panel columns) carry none.
    pub const fn validation(&self) -> Option<&ValidationReport> {
        self.validation.as_ref()
    }

    /// Ticker symbol.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// All observations, oldest first.
    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the series has no observations.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Date of the first observation.
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    /// Date of the last observation.
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    /// Observation dates, oldest first.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    /// Prices, oldest first.
    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    /// Price on an exact date.
    pub fn close_on(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|idx| self.points[idx].close)
    }

    /// Observations with `start <= date <= end`.
    pub fn slice(&self, start: NaiveDate, end: NaiveDate) -> Self {
        let lo = self.points.partition_point(|p| p.date < start);
        let hi = self.points.partition_point(|p| p.date <= end);
        let points = if lo < hi {
            self.points[lo..hi].to_vec()
        } else {
            Vec::new()
        };

        Self {
            symbol: self.symbol.clone(),
            points,
            validation: None,
        }
    }
}
