//! Alignment of several price series onto one trading calendar.

use crate::error::{DataError, Result};
use crate::series::{PricePoint, PriceSeries};
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// One instrument's prices on the panel calendar.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelColumn {
    symbol: String,
    values: Vec<Option<f64>>,
}

impl PanelColumn {
    /// Ticker symbol.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Prices on the panel calendar; `None` before the first observation.
    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }
}

/// Price series aligned on the union of their trading dates.
///
/// Each column is forward-filled after its first observation; leading gaps
/// stay `None` so that a young instrument does not truncate the history of
/// the others. The calendar ends at the latest common date, the earliest of
/// the instruments' last observations.
#[derive(Debug, Clone, PartialEq)]
pub struct PricePanel {
    dates: Vec<NaiveDate>,
    columns: Vec<PanelColumn>,
}

impl PricePanel {
    /// Align the given series.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::MissingData`] when no series has observations.
    pub fn align(series: &[PriceSeries]) -> Result<Self> {
        let usable: Vec<&PriceSeries> = series.iter().filter(|s| !s.is_empty()).collect();

        let end = usable
            .iter()
            .filter_map(|s| s.last_date())
            .min()
            .ok_or_else(|| DataError::missing("panel", "No price series to align"))?;

        let dates: Vec<NaiveDate> = usable
            .iter()
            .flat_map(|s| s.points().iter().map(|p| p.date))
            .filter(|date| *date <= end)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let columns = usable
            .iter()
            .map(|s| PanelColumn {
                symbol: s.symbol().to_string(),
                values: forward_fill(s.points(), &dates),
            })
            .collect();

        Ok(Self { dates, columns })
    }

    /// Panel calendar, oldest first.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Number of calendar dates.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether the calendar is empty.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// The latest common date.
    pub fn end_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// All columns in input order.
    pub fn columns(&self) -> &[PanelColumn] {
        &self.columns
    }

    /// Symbols in input order.
    pub fn symbols(&self) -> Vec<&str> {
        self.columns.iter().map(PanelColumn::symbol).collect()
    }

    /// Column for a symbol.
    pub fn column(&self, symbol: &str) -> Option<&PanelColumn> {
        self.columns.iter().find(|c| c.symbol == symbol)
    }

    /// The aligned, forward-filled series of one symbol.
    pub fn series(&self, symbol: &str) -> Option<PriceSeries> {
        let column = self.column(symbol)?;
        let points = self
            .dates
            .iter()
            .zip(&column.values)
            .filter_map(|(date, value)| value.map(|close| PricePoint::new(*date, close)))
            .collect();

        Some(PriceSeries::from_points(symbol, points))
    }

    /// The panel restricted to `start <= date`.
    pub fn since(&self, start: NaiveDate) -> Self {
        let lo = self.dates.partition_point(|d| *d < start);
        Self {
            dates: self.dates[lo..].to_vec(),
            columns: self
                .columns
                .iter()
                .map(|c| PanelColumn {
                    symbol: c.symbol.clone(),
                    values: c.values[lo..].to_vec(),
                })
                .collect(),
        }
    }
}

fn forward_fill(points: &[PricePoint], dates: &[NaiveDate]) -> Vec<Option<f64>> {
    let mut values = Vec::with_capacity(dates.len());
    let mut cursor = 0;
    let mut last = None;

    for date in dates {
        while cursor < points.len() && points[cursor].date <= *date {
            last = Some(points[cursor].close);
            cursor += 1;
        }
        values.push(last);
    }

    values
}
