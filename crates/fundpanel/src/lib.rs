//! # fundpanel
//!
//! Fundamentals panels for equity research.
//!
//! This crate provides a unified interface to the fundpanel ecosystem: wide
//! (entity x period) panels, ratio and winsorization transforms, stable
//! multi-year growth estimates and composite growth scores, plus the batch
//! pipeline that ties them together. Individual components can be enabled via
//! feature flags.
//!
//! ## Features
//!
//! - `full` (default): Enables all components
//! - `primitives`: Panel, record and estimate types
//! - `traits`: Source, sink, transform and estimator abstractions
//! - `math`: Winsorization, ratios and cross-sectional statistics
//! - `growth`: Stable growth rates and composite growth scores
//! - `pipeline`: Configured batch runs and paced record collection
//! - `utils`: Long-to-wide reshaping and CSV I/O
//! - `cli`: The `fundpanel` command-line tool
//!
//! ## Example
//!
//! ```rust,ignore
//! use fundpanel::{growth::CompositeGrowthBuilder, utils::read_panel_csv};
//!
//! let panel = read_panel_csv("data/fcfe.csv")?;
//! let table = CompositeGrowthBuilder::new().build(&panel, "fcfe")?;
//! for row in table.rows().iter().take(10) {
//!     println!("{} {:.3}", row.entity, row.composite);
//! }
//! ```

#![doc(issue_tracker_base_url = "https://github.com/factordynamics/fundpanel/issues/")]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

#[cfg(feature = "primitives")]
#[doc(inline)]
pub use fundpanel_primitives as primitives;
#[cfg(feature = "traits")]
#[doc(inline)]
pub use fundpanel_traits as traits;
#[cfg(feature = "math")]
#[doc(inline)]
pub use fundpanel_math as math;
#[cfg(feature = "growth")]
#[doc(inline)]
pub use fundpanel_growth as growth;
#[cfg(feature = "pipeline")]
#[doc(inline)]
pub use fundpanel_pipeline as pipeline;
#[cfg(feature = "utils")]
#[doc(inline)]
pub use fundpanel_utils as utils;
