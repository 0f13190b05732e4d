//! Error types for mathematical operations.

use fundpanel_primitives::PanelError;

/// Errors that can occur during mathematical operations.
#[derive(Debug, thiserror::Error)]
pub enum MathError {
    /// Invalid quantile pair.
    #[error("invalid quantiles: ({lower}, {upper}) (need 0 <= lower < upper <= 1)")]
    InvalidQuantiles {
        /// Lower quantile.
        lower: f64,
        /// Upper quantile.
        upper: f64,
    },

    /// Dimension mismatch.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Actual dimension.
        actual: usize,
    },

    /// Empty data.
    #[error("empty data provided")]
    EmptyData,

    /// Panel could not be assembled.
    #[error("panel error: {0}")]
    Panel(#[from] PanelError),

    /// Polars error.
    #[error("polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),
}
