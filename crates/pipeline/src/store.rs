//! CSV-backed record storage.
//!
//! Record files hold one `entity,period,field,value` row per observation,
//! periods as ISO dates and missing values as empty cells.

use std::{
    collections::BTreeMap,
    fs::OpenOptions,
    path::{Path, PathBuf},
};

use fundpanel_primitives::{EntityId, FundamentalRecord};
use fundpanel_traits::{FundamentalsSource, RecordSink, SinkError, SourceError};
use tracing::{debug, info};

use crate::PipelineError;

/// Appends record batches to a CSV file.
#[derive(Debug, Clone)]
pub struct CsvRecordSink {
    path: PathBuf,
}

impl CsvRecordSink {
    /// Start a fresh record file, truncating any existing one.
    ///
    /// # Errors
    /// Returns an I/O error if the file or its parent cannot be created.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, PipelineError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::File::create(&path)?;
        Ok(Self { path })
    }

    /// Append to an existing record file, creating it if absent.
    #[must_use]
    pub fn append(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the record file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSink for CsvRecordSink {
    fn write_batch(&mut self, batch: &[FundamentalRecord]) -> Result<(), SinkError> {
        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let needs_header = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new().has_headers(needs_header).from_writer(file);
        for record in batch {
            writer.serialize(record).map_err(|e| SinkError::Serialization(e.to_string()))?;
        }
        writer.flush()?;
        debug!(path = %self.path.display(), rows = batch.len(), "appended records");
        Ok(())
    }
}

/// Replays a record file as a source, one entity at a time.
#[derive(Debug, Clone, Default)]
pub struct CsvRecordSource {
    name: String,
    records: BTreeMap<EntityId, Vec<FundamentalRecord>>,
}

impl CsvRecordSource {
    /// Load a record file.
    ///
    /// # Errors
    /// Returns `PipelineError::MissingInput` if the file does not exist and
    /// `PipelineError::Csv` for malformed rows.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PipelineError::MissingInput(path.to_path_buf()));
        }

        let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;
        let mut rows = Vec::new();
        for result in reader.deserialize::<FundamentalRecord>() {
            rows.push(result?);
        }

        let source = Self::from_records(path.display().to_string(), rows);
        info!(
            path = %path.display(),
            entities = source.records.len(),
            "loaded record source"
        );
        Ok(source)
    }

    /// Source over in-memory records.
    #[must_use]
    pub fn from_records(name: impl Into<String>, rows: Vec<FundamentalRecord>) -> Self {
        let mut records: BTreeMap<EntityId, Vec<FundamentalRecord>> = BTreeMap::new();
        for row in rows {
            records.entry(row.entity.clone()).or_default().push(row);
        }
        Self { name: name.into(), records }
    }

    /// Entities present in the source, ascending.
    #[must_use]
    pub fn entities(&self) -> Vec<EntityId> {
        self.records.keys().cloned().collect()
    }
}

impl FundamentalsSource for CsvRecordSource {
    fn fetch(&mut self, entity: &EntityId) -> Result<Vec<FundamentalRecord>, SourceError> {
        self.records
            .get(entity)
            .cloned()
            .ok_or_else(|| SourceError::UnknownEntity(entity.clone()))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
