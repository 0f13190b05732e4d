#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/fundpanel/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod column;

mod period;
pub use period::{format_period, parse_period};

mod pivot;
pub use pivot::{LongLayout, frame_to_records, pivot_field, pivot_wide, records_to_frame};

mod io;
pub use io::{
    frame_to_panel, panel_to_frame, read_frame_csv, read_long_csv, read_panel_csv,
    write_frame_csv, write_panel_csv,
};

mod inspect;
pub use inspect::inspection_frame;

mod error;
pub use error::UtilsError;
