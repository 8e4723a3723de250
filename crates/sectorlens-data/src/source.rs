//! The market-data boundary.

use crate::error::Result;
use crate::series::PriceSeries;
use chrono::NaiveDate;
use std::future::Future;

/// Anything that can produce a daily price history for a symbol.
///
/// The Yahoo provider is the production implementation; tests drive the
/// pipeline with in-memory sources.
pub trait PriceSource {
    /// Fetch the daily history of `symbol` between `start` and `end`
    /// (both inclusive).
    ///
    /// # Errors
    ///
    /// Implementations return [`DataError::MissingData`] when the provider
    /// has nothing for the symbol.
    ///
    /// [`DataError::MissingData`]: crate::DataError::MissingData
    fn fetch_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Future<Output = Result<PriceSeries>> + Send;
}
