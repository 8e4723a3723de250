#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/sectorlens/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod pipeline;
pub mod settings;
pub mod universe;

// Re-export main types from sub-crates
pub use sectorlens_data as data;
pub use sectorlens_output as output;
pub use sectorlens_risk as risk;

pub use pipeline::{Pipeline, PipelineError, RunSummary};
pub use settings::{Settings, SettingsError};
pub use universe::{GicsSector, Instrument, InstrumentRole, SectorUniverse, Universe};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
