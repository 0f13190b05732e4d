#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/fundpanel/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod cross_section;
pub use cross_section::{finite_moments, grouped_zscore, zscore};

mod winsorize;
pub use winsorize::{
    WinsorAxis, Winsorizer, validate_quantiles, winsorize, winsorize_frame, winsorize_panel,
};

mod ratio;
pub use ratio::{panel_ratio, safe_divide};

mod error;
pub use error::MathError;
