#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/fundpanel/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod entity;
pub use entity::EntityId;

mod panel;
pub use panel::{PanelError, WidePanel};

mod record;
pub use record::FundamentalRecord;

mod estimate;
pub use estimate::GrowthEstimate;

/// Period-end date of a report.
pub type Period = chrono::NaiveDate;
