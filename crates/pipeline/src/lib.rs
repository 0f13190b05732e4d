#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/fundpanel/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod config;
pub use config::{GrowthJob, PipelineConfig, PivotJob, RatioJob, WinsorConfig};

mod collector;
pub use collector::{CollectionSummary, Collector, CollectorConfig};

mod store;
pub use store::{CsvRecordSink, CsvRecordSource};

mod runner;
pub use runner::{Pipeline, RunSummary, run_config_file};

mod error;
pub use error::PipelineError;

/// Re-export commonly used types.
pub mod prelude {
    pub use fundpanel_traits::{FundamentalsSource, RecordSink};

    pub use super::{Collector, CollectorConfig, Pipeline, PipelineConfig, PipelineError};
}
