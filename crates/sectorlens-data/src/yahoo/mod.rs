//! Yahoo Finance data provider.

pub mod quotes;

pub use quotes::{PriceField, YahooQuoteProvider, series_from_quotes};
