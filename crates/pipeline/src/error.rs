//! Error types for pipeline runs.

use std::path::PathBuf;

use fundpanel_growth::GrowthError;
use fundpanel_math::MathError;
use fundpanel_utils::UtilsError;

/// Errors that abort a pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A required input file does not exist.
    #[error("missing input file: {}", .0.display())]
    MissingInput(PathBuf),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be parsed.
    #[error("config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV record error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Math error.
    #[error("math error: {0}")]
    Math(#[from] MathError),

    /// Growth scoring error.
    #[error("growth error: {0}")]
    Growth(#[from] GrowthError),

    /// Reshaping or tabular I/O error.
    #[error("data error: {0}")]
    Utils(UtilsError),
}

impl From<UtilsError> for PipelineError {
    fn from(err: UtilsError) -> Self {
        match err {
            UtilsError::MissingFile(path) => Self::MissingInput(path),
            other => Self::Utils(other),
        }
    }
}
