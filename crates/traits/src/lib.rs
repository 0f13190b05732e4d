#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/fundpanel/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod transform;
pub use transform::{PanelTransform, TransformError};

mod source;
pub use source::{FundamentalsSource, SourceError};

mod sink;
pub use sink::{RecordSink, SinkError};

mod growth;
pub use growth::GrowthEstimator;
