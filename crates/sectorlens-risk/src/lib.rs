#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/sectorlens/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod correlation;
pub mod error;
pub mod metrics;
pub mod period;
pub mod returns;
pub mod stats;

// Re-export main types
pub use correlation::{
    CorrelationMatrix, CorrelationPoint, RollingCorrelationSeries, rolling_correlation,
};
pub use error::RiskError;
pub use metrics::{HistoryPolicy, MetricRow, MetricsConfig, MetricsEngine, SliceStatistics};
pub use period::Period;
