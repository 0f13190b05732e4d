#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/fundpanel/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod stable;
pub use stable::{StableGrowthConfig, StableGrowthEstimator};

mod composite;
pub use composite::{CompositeGrowthBuilder, CompositeGrowthConfig, DegeneratePolicy};

mod table;
pub use table::{GrowthScoreRow, GrowthScoreTable};

mod scoring;
pub use scoring::{Dimension, DimensionScoreConfig, DimensionScorer, MIN_GROUP_SIZE};

mod error;
pub use error::GrowthError;
