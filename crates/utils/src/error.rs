//! Error types for utility functions.

use std::path::PathBuf;

use fundpanel_primitives::PanelError;

/// Errors that can occur during utility operations.
#[derive(Debug, thiserror::Error)]
pub enum UtilsError {
    /// Polars error.
    #[error("polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Panel could not be assembled.
    #[error("panel error: {0}")]
    Panel(#[from] PanelError),

    /// Input file does not exist.
    #[error("missing input file: {}", .0.display())]
    MissingFile(PathBuf),

    /// Invalid parameter.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Missing column.
    #[error("missing column: {0}")]
    MissingColumn(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = UtilsError::InvalidParameter("bad value".to_string());
        assert!(err.to_string().contains("bad value"));

        let err = UtilsError::MissingFile(PathBuf::from("/data/fcfe.csv"));
        assert_eq!(err.to_string(), "missing input file: /data/fcfe.csv");
    }
}
