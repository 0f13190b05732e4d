//! Pipeline run configuration.

use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

use fundpanel_growth::{CompositeGrowthConfig, StableGrowthConfig};
use fundpanel_math::{WinsorAxis, Winsorizer};
use fundpanel_utils::LongLayout;
use serde::{Deserialize, Serialize};

use crate::{CollectorConfig, PipelineError};

/// Winsorization applied to derived ratio panels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WinsorConfig {
    /// Lower quantile.
    pub lower: f64,
    /// Upper quantile.
    pub upper: f64,
    /// Clip per period column or per entity row.
    pub axis: WinsorAxis,
}

impl Default for WinsorConfig {
    fn default() -> Self {
        Self { lower: 0.01, upper: 0.99, axis: WinsorAxis::Columns }
    }
}

impl WinsorConfig {
    /// Build the configured winsorizer.
    ///
    /// # Errors
    /// Returns `PipelineError::Math` if the quantiles are invalid.
    pub fn winsorizer(&self) -> Result<Winsorizer, PipelineError> {
        Ok(Winsorizer::with_axis(self.lower, self.upper, self.axis)?)
    }
}

/// Long table to wide panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PivotJob {
    /// Long CSV file under the input directory.
    pub input: String,
    /// Value column, or field name when `tidy` is set.
    pub value: String,
    /// Input is a tidy `(entity, period, field, value)` table.
    #[serde(default)]
    pub tidy: bool,
    /// Name of the produced panel.
    pub output: String,
}

const fn yes() -> bool {
    true
}

/// Elementwise ratio of two panels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatioJob {
    /// Numerator panel name.
    pub numerator: String,
    /// Denominator panel name.
    pub denominator: String,
    /// Name of the produced panel.
    pub output: String,
    /// Winsorize the ratio before writing it.
    #[serde(default = "yes")]
    pub winsorize: bool,
}

/// Composite growth scores of one panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrowthJob {
    /// Panel name.
    pub panel: String,
    /// Factor prefix for output columns and file name.
    pub prefix: String,
    /// Horizons overriding the composite configuration.
    #[serde(default)]
    pub horizons: Option<Vec<u32>>,
}

/// Complete description of one pipeline run.
///
/// Panel names resolve to `<name>.csv`: in memory if an earlier job of the
/// run produced them, otherwise under `input_dir`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory of input CSV files.
    pub input_dir: PathBuf,
    /// Directory receiving every output file.
    pub output_dir: PathBuf,
    /// Column names of long input tables.
    pub layout: LongLayout,
    /// Ratio winsorization.
    pub winsor: WinsorConfig,
    /// Pivot jobs, run first.
    pub pivots: Vec<PivotJob>,
    /// Ratio jobs, run after pivots.
    pub ratios: Vec<RatioJob>,
    /// Growth jobs, run last.
    pub growth: Vec<GrowthJob>,
    /// Per-entity growth estimator parameters.
    pub stable_growth: StableGrowthConfig,
    /// Composite scoring parameters.
    pub composite: CompositeGrowthConfig,
    /// Collector pacing and batching.
    pub collector: CollectorConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("outputs"),
            layout: LongLayout::default(),
            winsor: WinsorConfig::default(),
            pivots: Vec::new(),
            ratios: Vec::new(),
            growth: Vec::new(),
            stable_growth: StableGrowthConfig::default(),
            composite: CompositeGrowthConfig::default(),
            collector: CollectorConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Parse a JSON configuration and validate it.
    ///
    /// # Errors
    /// Returns `PipelineError::ConfigParse` for malformed JSON or any
    /// validation error.
    pub fn from_json_str(json: &str) -> Result<Self, PipelineError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    ///
    /// # Errors
    /// Returns `PipelineError::MissingInput` if the file does not exist.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PipelineError::MissingInput(path.to_path_buf()));
        }
        Self::from_json_str(&std::fs::read_to_string(path)?)
    }

    /// Composite configuration of a growth job.
    #[must_use]
    pub fn composite_for(&self, job: &GrowthJob) -> CompositeGrowthConfig {
        match &job.horizons {
            Some(horizons) => {
                CompositeGrowthConfig { horizons: horizons.clone(), ..self.composite.clone() }
            }
            None => self.composite.clone(),
        }
    }

    /// Check parameters and job wiring.
    ///
    /// # Errors
    /// Returns `PipelineError::InvalidConfig` for empty names or a panel
    /// produced twice, and the component error for invalid parameters.
    pub fn validate(&self) -> Result<(), PipelineError> {
        self.winsor.winsorizer()?;
        self.stable_growth.validate()?;
        self.composite.validate()?;
        self.collector.validate()?;

        let mut produced = BTreeSet::new();
        let outputs = self.pivots.iter().map(|j| &j.output);
        for name in outputs.chain(self.ratios.iter().map(|j| &j.output)) {
            check_name(name)?;
            if !produced.insert(name.as_str()) {
                return Err(PipelineError::InvalidConfig(format!("panel {name} produced twice")));
            }
        }

        for job in &self.pivots {
            check_name(&job.input)?;
            check_name(&job.value)?;
        }
        for job in &self.ratios {
            check_name(&job.numerator)?;
            check_name(&job.denominator)?;
        }
        for job in &self.growth {
            check_name(&job.panel)?;
            check_name(&job.prefix)?;
            self.composite_for(job).validate()?;
        }
        Ok(())
    }
}

fn check_name(name: &str) -> Result<(), PipelineError> {
    if name.trim().is_empty() {
        return Err(PipelineError::InvalidConfig("job names must not be empty".to_string()));
    }
    if name.contains(['/', '\\']) {
        return Err(PipelineError::InvalidConfig(format!("{name} must be a plain file name")));
    }
    Ok(())
}
