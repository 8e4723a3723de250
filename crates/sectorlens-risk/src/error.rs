//! Error types for risk computations.

use thiserror::Error;

/// Errors that can occur while computing statistics.
#[derive(Debug, Error, PartialEq)]
pub enum RiskError {
    /// Too few observations for the requested statistic
    #[error("Insufficient history for {symbol}: need at least {required} observations, got {actual}")]
    InsufficientHistory {
        /// Instrument symbol
        symbol: String,
        /// Required number of observations
        required: usize,
        /// Actual number of observations
        actual: usize,
    },

    /// Invalid rolling window
    #[error("Invalid rolling window: {0} (must be at least 2)")]
    InvalidWindow(usize),

    /// Paired inputs of different length
    #[error("Length mismatch: expected {expected}, got {actual}")]
    LengthMismatch {
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// The benchmark is not among the inputs
    #[error("Benchmark {0} has no price data")]
    MissingBenchmark(String),
}
