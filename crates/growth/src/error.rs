//! Error types for growth factor construction.

/// Errors that can occur while building growth scores.
#[derive(Debug, thiserror::Error)]
pub enum GrowthError {
    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Cross-sectional statistics failed.
    #[error("math error: {0}")]
    Math(#[from] fundpanel_math::MathError),

    /// Score table could not be rendered.
    #[error("polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),
}
