//! Panel transformation trait definitions.

use fundpanel_primitives::{PanelError, WidePanel};

/// Errors that can occur during transformation.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// Empty input data.
    #[error("empty input data")]
    EmptyData,

    /// Invalid parameter.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Numerical error (NaN, Inf).
    #[error("numerical error: {0}")]
    Numerical(String),

    /// Output panel could not be assembled.
    #[error("panel error: {0}")]
    Panel(#[from] PanelError),
}

/// Pure transformation of a wide panel.
///
/// Implementations return a fresh panel and never mutate their input.
pub trait PanelTransform: Send + Sync {
    /// Apply the transformation.
    ///
    /// # Errors
    /// Returns `TransformError` if the panel cannot be transformed.
    fn transform(&self, panel: &WidePanel) -> Result<WidePanel, TransformError>;

    /// Returns the name of this transformation.
    fn name(&self) -> &str;
}
