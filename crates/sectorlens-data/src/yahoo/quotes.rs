//! Quote data fetching from Yahoo Finance.

use crate::error::{DataError, Result};
use crate::series::{PricePoint, PriceSeries};
use crate::source::PriceSource;
use crate::validation::validate_points;
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, NaiveTime, Utc};
use polars::prelude::*;
use std::time::Duration;
use tokio::time::sleep;
use yahoo_finance_api as yahoo;

/// Days between 0001-01-01 and 1970-01-01, the epoch of polars `Date` values.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Which quote column becomes the price series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriceField {
    /// Split- and dividend-adjusted close.
    #[default]
    AdjustedClose,
    /// Raw close.
    Close,
}

impl PriceField {
    /// Column name in the quote frame.
    pub const fn column(&self) -> &'static str {
        match self {
            Self::AdjustedClose => "adjusted_close",
            Self::Close => "close",
        }
    }
}

/// Yahoo Finance quote provider with a fixed delay between requests.
pub struct YahooQuoteProvider {
    provider: yahoo::YahooConnector,
    rate_limit_delay: Duration,
    price_field: PriceField,
}

impl std::fmt::Debug for YahooQuoteProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooQuoteProvider")
            .field("rate_limit_delay", &self.rate_limit_delay)
            .field("price_field", &self.price_field)
            .finish_non_exhaustive()
    }
}

impl YahooQuoteProvider {
    /// Create a provider with the default delay (250ms) reading adjusted closes.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        Self::with_rate_limit(Duration::from_millis(250))
    }

    /// Create a provider with a custom delay between requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_rate_limit(rate_limit_delay: Duration) -> Result<Self> {
        Ok(Self {
            provider: yahoo::YahooConnector::new()?,
            rate_limit_delay,
            price_field: PriceField::default(),
        })
    }

    /// Select the quote column used for price series.
    pub const fn with_price_field(mut self, price_field: PriceField) -> Self {
        self.price_field = price_field;
        self
    }

    /// Fetch OHLCV data for a single symbol.
    ///
    /// # Arguments
    /// * `symbol` - The ticker symbol (e.g., "XLK" or "^GSPC")
    /// * `start` - Start of the requested range
    /// * `end` - End of the requested range
    ///
    /// # Returns
    /// A Polars DataFrame with columns: symbol, date, open, high, low, close, volume, adjusted_close
    pub async fn fetch_quotes(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<DataFrame> {
        if start > end {
            return Err(DataError::InvalidDateRange {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            });
        }

        if symbol.is_empty() {
            return Err(DataError::InvalidSymbol("Empty symbol".to_string()));
        }

        let start_time = time::OffsetDateTime::from_unix_timestamp(start.timestamp())
            .map_err(|e| DataError::TimeConversion(e.to_string()))?;
        let end_time = time::OffsetDateTime::from_unix_timestamp(end.timestamp())
            .map_err(|e| DataError::TimeConversion(e.to_string()))?;

        let response = self
            .provider
            .get_quote_history(symbol, start_time, end_time)
            .await
            .map_err(|e| DataError::missing(symbol, e.to_string()))?;

        let quotes = response
            .quotes()
            .map_err(|e| DataError::missing(symbol, e.to_string()))?;

        // Applied after the request so that consecutive symbols are spaced out.
        sleep(self.rate_limit_delay).await;

        if quotes.is_empty() {
            return Err(DataError::missing(
                symbol,
                "No data returned from Yahoo Finance",
            ));
        }

        let dates: Vec<i64> = quotes.iter().map(|q| q.timestamp).collect();
        let opens: Vec<f64> = quotes.iter().map(|q| q.open).collect();
        let highs: Vec<f64> = quotes.iter().map(|q| q.high).collect();
        let lows: Vec<f64> = quotes.iter().map(|q| q.low).collect();
        let closes: Vec<f64> = quotes.iter().map(|q| q.close).collect();
        let volumes: Vec<u64> = quotes.iter().map(|q| q.volume).collect();
        let adj_closes: Vec<f64> = quotes.iter().map(|q| q.adjclose).collect();

        let mut df = DataFrame::new(vec![
            Series::new("timestamp".into(), dates).into(),
            Series::new("open".into(), opens).into(),
            Series::new("high".into(), highs).into(),
            Series::new("low".into(), lows).into(),
            Series::new("close".into(), closes).into(),
            Series::new("volume".into(), volumes).into(),
            Series::new("adjusted_close".into(), adj_closes).into(),
        ])?;

        let symbol_col: Column = Series::new("symbol".into(), vec![symbol; df.height()]).into();
        df.with_column(symbol_col)?;

        let df = df
            .lazy()
            .with_column(
                (col("timestamp") * lit(1_000_000_000))
                    .cast(DataType::Datetime(TimeUnit::Nanoseconds, None))
                    .cast(DataType::Date)
                    .alias("date"),
            )
            .select(&[
                col("symbol"),
                col("date"),
                col("open"),
                col("high"),
                col("low"),
                col("close"),
                col("volume"),
                col("adjusted_close"),
            ])
            .collect()?;

        Ok(df)
    }
}

impl PriceSource for YahooQuoteProvider {
    async fn fetch_history(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries> {
        let start_time = start.and_time(NaiveTime::MIN).and_utc();
        // Yahoo treats the end as exclusive
        let end_time = (end + ChronoDuration::days(1)).and_time(NaiveTime::MIN).and_utc();

        let quotes = self.fetch_quotes(symbol, start_time, end_time).await?;
        let series = series_from_quotes(symbol, &quotes, self.price_field)?;
        if series.is_empty() {
            return Err(DataError::missing(symbol, "No usable prices in quote data"));
        }

        Ok(series)
    }
}

/// Convert a quote frame from [`YahooQuoteProvider::fetch_quotes`] into a
/// price series, validating the raw rows on the way.
///
/// # Errors
///
/// Returns an error if the `date` or price column is missing or mistyped.
pub fn series_from_quotes(
    symbol: &str,
    quotes: &DataFrame,
    field: PriceField,
) -> Result<PriceSeries> {
    let days = quotes
        .column("date")?
        .as_materialized_series()
        .cast(&DataType::Int32)?;
    let days = days.i32()?;
    let prices = quotes.column(field.column())?.as_materialized_series().f64()?;

    let mut points = Vec::with_capacity(quotes.height());
    for (day, price) in days.into_iter().zip(prices) {
        let (Some(day), Some(price)) = (day, price) else {
            continue;
        };
        let date = NaiveDate::from_num_days_from_ce_opt(day + UNIX_EPOCH_DAYS_FROM_CE)
            .ok_or_else(|| DataError::TimeConversion(format!("day {day} out of range")))?;
        points.push(PricePoint::new(date, price));
    }

    let report = validate_points(symbol, &points);
    Ok(PriceSeries::from_points(symbol, points).with_validation(report))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote_frame() -> DataFrame {
        let days: Vec<i32> = vec![19_723, 19_724, 19_724, 19_727];
        let closes = vec![100.0, 101.0, 101.5, 99.0];
        let adjusted = vec![98.0, 99.0, 99.5, f64::NAN];

        DataFrame::new(vec![
            Series::new("date".into(), days)
                .cast(&DataType::Date)
                .unwrap()
                .into(),
            Series::new("close".into(), closes).into(),
            Series::new("adjusted_close".into(), adjusted).into(),
        ])
        .unwrap()
    }

    #[test]
    fn test_series_from_quotes_adjusted_close() {
        let series = series_from_quotes("XLK", &quote_frame(), PriceField::AdjustedClose).unwrap();

        // 19723 days after the epoch is 2024-01-01
        assert_eq!(
            series.first_date(),
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
        assert_eq!(series.closes(), vec![98.0, 99.5]);

        let report = series.validation().unwrap();
        assert_eq!(report.observations, 4);
        assert_eq!(report.duplicate_dates, 1);
        assert_eq!(report.invalid_prices, 1);
        assert_eq!(report.out_of_order, 0);
    }

    #[test]
    fn test_series_from_quotes_close() {
        let series = series_from_quotes("XLK", &quote_frame(), PriceField::Close).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.last_date(), NaiveDate::from_ymd_opt(2024, 1, 5));
    }

    #[test]
    fn test_series_from_quotes_missing_column() {
        let df = quote_frame().drop("adjusted_close").unwrap();
        let result = series_from_quotes("XLK", &df, PriceField::AdjustedClose);
        assert!(matches!(result, Err(DataError::Polars(_))));
    }

    #[tokio::test]
    async fn test_invalid_date_range() {
        let provider = YahooQuoteProvider::new().unwrap();
        let start = Utc::now();
        let end = start - ChronoDuration::days(30);

        let result = provider.fetch_quotes("XLK", start, end).await;
        assert!(matches!(result, Err(DataError::InvalidDateRange { .. })));
    }

    #[tokio::test]
    async fn test_invalid_symbol() {
        let provider = YahooQuoteProvider::new().unwrap();
        let end = Utc::now();
        let start = end - ChronoDuration::days(30);

        let result = provider.fetch_quotes("", start, end).await;
        assert!(matches!(result, Err(DataError::InvalidSymbol(_))));
    }
}
