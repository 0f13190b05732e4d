//! Paced, batched collection of long-format records.

use std::{thread, time::Duration};

use fundpanel_primitives::{EntityId, FundamentalRecord};
use fundpanel_traits::{FundamentalsSource, RecordSink};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::PipelineError;

/// Collector pacing and batching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Pause between successive source calls, in milliseconds.
    pub request_delay_ms: u64,
    /// Records buffered before a batch is written.
    pub batch_size: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self { request_delay_ms: 200, batch_size: 1000 }
    }
}

impl CollectorConfig {
    /// Pause between successive source calls.
    #[must_use]
    pub const fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    /// Check the batch size.
    ///
    /// # Errors
    /// Returns `PipelineError::InvalidConfig` for a zero batch size.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.batch_size == 0 {
            return Err(PipelineError::InvalidConfig("batch_size must be positive".into()));
        }
        Ok(())
    }
}

/// Outcome counts of one collection run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CollectionSummary {
    /// Entities fetched successfully.
    pub entities_fetched: usize,
    /// Entities skipped after a fetch error.
    pub entities_failed: usize,
    /// Records persisted.
    pub rows_written: usize,
    /// Batches persisted.
    pub batches_written: usize,
    /// Batches discarded after a sink error.
    pub batches_dropped: usize,
    /// Records lost with dropped batches.
    pub rows_dropped: usize,
}

/// Pulls records entity by entity from a source into a sink.
///
/// Calls are sequential with a fixed blocking delay between them. A failing
/// entity is logged and skipped; a failing batch is logged and discarded.
/// Nothing is retried.
#[derive(Debug)]
pub struct Collector<S, K> {
    source: S,
    sink: K,
    config: CollectorConfig,
}

impl<S: FundamentalsSource, K: RecordSink> Collector<S, K> {
    /// Create a collector.
    #[must_use]
    pub const fn new(source: S, sink: K, config: CollectorConfig) -> Self {
        Self { source, sink, config }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// Returns the sink.
    #[must_use]
    pub const fn sink(&self) -> &K {
        &self.sink
    }

    /// Consume the collector, returning source and sink.
    pub fn into_parts(self) -> (S, K) {
        (self.source, self.sink)
    }

    /// Collect every entity in order.
    ///
    /// # Errors
    /// Returns `PipelineError::InvalidConfig` for an invalid configuration.
    /// Fetch and sink failures are recorded in the summary, not returned.
    pub fn run(&mut self, entities: &[EntityId]) -> Result<CollectionSummary, PipelineError> {
        self.config.validate()?;
        let delay = self.config.request_delay();
        let mut summary = CollectionSummary::default();
        let mut buffer: Vec<FundamentalRecord> = Vec::with_capacity(self.config.batch_size);

        info!(source = self.source.name(), entities = entities.len(), "starting collection");

        for (i, entity) in entities.iter().enumerate() {
            if i > 0 && !delay.is_zero() {
                thread::sleep(delay);
            }

            match self.source.fetch(entity) {
                Ok(records) => {
                    debug!(%entity, rows = records.len(), "fetched");
                    summary.entities_fetched += 1;
                    for record in records {
                        buffer.push(record);
                        if buffer.len() >= self.config.batch_size {
                            self.flush(&mut buffer, &mut summary);
                        }
                    }
                }
                Err(err) => {
                    warn!(%entity, error = %err, "fetch failed, skipping entity");
                    summary.entities_failed += 1;
                }
            }

            if (i + 1) % 100 == 0 {
                info!(done = i + 1, total = entities.len(), "collection progress");
            }
        }

        if !buffer.is_empty() {
            self.flush(&mut buffer, &mut summary);
        }

        info!(
            fetched = summary.entities_fetched,
            failed = summary.entities_failed,
            rows = summary.rows_written,
            dropped_batches = summary.batches_dropped,
            "collection finished"
        );
        Ok(summary)
    }

    fn flush(&mut self, buffer: &mut Vec<FundamentalRecord>, summary: &mut CollectionSummary) {
        match self.sink.write_batch(buffer) {
            Ok(()) => {
                summary.batches_written += 1;
                summary.rows_written += buffer.len();
                debug!(rows = buffer.len(), "batch written");
            }
            Err(err) => {
                error!(rows = buffer.len(), error = %err, "batch write failed, dropping batch");
                summary.batches_dropped += 1;
                summary.rows_dropped += buffer.len();
            }
        }
        buffer.clear();
    }
}
