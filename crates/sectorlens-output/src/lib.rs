#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/sectorlens/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod charts;
pub mod export;
pub mod report;
pub mod summary;
pub mod workbook;

pub use charts::{ChartError, ChartRenderer, LineData};
pub use export::{CorrelationRecord, ExportError, ExportFormat, Exporter, MetricRecord};
pub use report::{FailedSymbol, MetricsReport, ReportError, RunReport, SortKey, sort_rows};
pub use summary::{period_table, summary_tables};
pub use workbook::WorkbookWriter;
