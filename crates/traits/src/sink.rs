//! Record sink trait definitions.

use fundpanel_primitives::FundamentalRecord;

/// Errors that can occur while persisting a batch.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// I/O failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The sink refused the batch.
    #[error("batch rejected: {0}")]
    Rejected(String),
}

/// Destination for batches of long-format records.
pub trait RecordSink {
    /// Persist one batch. A failed batch is not retried by callers.
    ///
    /// # Errors
    /// Returns `SinkError` if the batch could not be written.
    fn write_batch(&mut self, batch: &[FundamentalRecord]) -> Result<(), SinkError>;
}

impl RecordSink for Vec<FundamentalRecord> {
    fn write_batch(&mut self, batch: &[FundamentalRecord]) -> Result<(), SinkError> {
        self.extend_from_slice(batch);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use fundpanel_primitives::Period;

    use super::*;

    #[test]
    fn vec_sink_collects_batches() {
        let period = Period::from_ymd_opt(2024, 3, 31).unwrap();
        let mut sink: Vec<FundamentalRecord> = Vec::new();
        sink.write_batch(&[FundamentalRecord::new("A", period, "fcfe", Some(1.0))]).unwrap();
        sink.write_batch(&[FundamentalRecord::new("B", period, "fcfe", None)]).unwrap();
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn sink_error_display() {
        let err = SinkError::Rejected("duplicate key".to_string());
        assert_eq!(err.to_string(), "batch rejected: duplicate key");
    }
}
