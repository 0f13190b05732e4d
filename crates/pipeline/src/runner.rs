//! Pipeline execution.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use fundpanel_growth::{CompositeGrowthBuilder, StableGrowthEstimator};
use fundpanel_math::panel_ratio;
use fundpanel_primitives::{EntityId, WidePanel};
use fundpanel_traits::{FundamentalsSource, GrowthEstimator, RecordSink};
use fundpanel_utils::{pivot_field, pivot_wide, read_long_csv, read_panel_csv};
use fundpanel_utils::{write_frame_csv, write_panel_csv};
use tracing::{info, warn};

use crate::{
    CollectionSummary, Collector, GrowthJob, PipelineConfig, PipelineError, PivotJob, RatioJob,
};

/// Files produced by a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Wide panels written, in job order.
    pub panels: Vec<PathBuf>,
    /// Growth score tables written, in job order.
    pub score_tables: Vec<PathBuf>,
}

/// Executes the jobs of a validated configuration.
///
/// Pivots run first, then ratios, then growth scores. Panels produced by a
/// job are available to later jobs by name without re-reading them.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a pipeline, validating the configuration.
    ///
    /// # Errors
    /// Returns the validation error of an invalid configuration.
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Collect `entities` from `source` into `sink` with the configured
    /// pacing and batching.
    ///
    /// # Errors
    /// See [`Collector::run`].
    pub fn collect<S, K>(
        &self,
        source: S,
        sink: K,
        entities: &[EntityId],
    ) -> Result<CollectionSummary, PipelineError>
    where
        S: FundamentalsSource,
        K: RecordSink,
    {
        Collector::new(source, sink, self.config.collector).run(entities)
    }

    /// Run every job.
    ///
    /// # Errors
    /// Returns `PipelineError::MissingInput` naming the first absent input
    /// file; any other error also aborts the run.
    pub fn run(&self) -> Result<RunSummary, PipelineError> {
        let jobs = self.config.pivots.len() + self.config.ratios.len() + self.config.growth.len();
        if jobs == 0 {
            warn!("pipeline has no jobs");
        }
        info!(
            input = %self.config.input_dir.display(),
            output = %self.config.output_dir.display(),
            jobs,
            "starting pipeline"
        );

        let mut panels: BTreeMap<String, WidePanel> = BTreeMap::new();
        let mut summary = RunSummary::default();

        for job in &self.config.pivots {
            let panel = self.pivot(job)?;
            summary.panels.push(self.save_panel(&job.output, &panel)?);
            panels.insert(job.output.clone(), panel);
        }

        for job in &self.config.ratios {
            let panel = self.ratio(job, &panels)?;
            summary.panels.push(self.save_panel(&job.output, &panel)?);
            panels.insert(job.output.clone(), panel);
        }

        for job in &self.config.growth {
            summary.score_tables.push(self.growth(job, &panels)?);
        }

        info!(
            panels = summary.panels.len(),
            score_tables = summary.score_tables.len(),
            "pipeline finished"
        );
        Ok(summary)
    }

    fn input_path(&self, file: &str) -> PathBuf {
        self.config.input_dir.join(file)
    }

    fn output_path(&self, name: &str) -> PathBuf {
        self.config.output_dir.join(format!("{name}.csv"))
    }

    fn save_panel(&self, name: &str, panel: &WidePanel) -> Result<PathBuf, PipelineError> {
        let path = self.output_path(name);
        write_panel_csv(panel, &path)?;
        Ok(path)
    }

    /// Panel produced earlier in the run, else `<name>.csv` under the input directory.
    fn resolve(
        &self,
        name: &str,
        panels: &BTreeMap<String, WidePanel>,
    ) -> Result<WidePanel, PipelineError> {
        match panels.get(name) {
            Some(panel) => Ok(panel.clone()),
            None => Ok(read_panel_csv(self.input_path(&format!("{name}.csv")))?),
        }
    }

    fn pivot(&self, job: &PivotJob) -> Result<WidePanel, PipelineError> {
        let frame = read_long_csv(self.input_path(&job.input))?;
        let layout = &self.config.layout;
        let panel = if job.tidy {
            pivot_field(&frame, layout, &job.value)?
        } else {
            pivot_wide(&frame, layout, &job.value)?
        };
        info!(
            input = %job.input,
            value = %job.value,
            entities = panel.n_entities(),
            periods = panel.n_periods(),
            "pivot done"
        );
        Ok(panel)
    }

    fn ratio(
        &self,
        job: &RatioJob,
        panels: &BTreeMap<String, WidePanel>,
    ) -> Result<WidePanel, PipelineError> {
        let numerator = self.resolve(&job.numerator, panels)?;
        let denominator = self.resolve(&job.denominator, panels)?;
        let ratio = panel_ratio(&numerator, &denominator)?;
        let ratio = if job.winsorize {
            self.config.winsor.winsorizer()?.apply_panel(&ratio)?
        } else {
            ratio
        };
        info!(
            output = %job.output,
            entities = ratio.n_entities(),
            periods = ratio.n_periods(),
            valid = ratio.count_valid(),
            winsorized = job.winsorize,
            "ratio done"
        );
        Ok(ratio)
    }

    fn growth(
        &self,
        job: &GrowthJob,
        panels: &BTreeMap<String, WidePanel>,
    ) -> Result<PathBuf, PipelineError> {
        let panel = self.resolve(&job.panel, panels)?;
        let estimator = StableGrowthEstimator::with_config(self.config.stable_growth);
        let composite = self.config.composite_for(job);
        let table = CompositeGrowthBuilder::with_config(estimator, composite)
            .build(&panel, &job.prefix)?;

        let path = self.output_path(&format!("{}_growth_scores", job.prefix));
        write_frame_csv(&table.to_frame()?, &path)?;
        info!(
            prefix = %job.prefix,
            retained = table.len(),
            path = %path.display(),
            "growth scores saved"
        );
        Ok(path)
    }
}

/// Run a pipeline from a JSON configuration file.
///
/// # Errors
/// Returns `PipelineError::MissingInput` if the file or any input is absent.
pub fn run_config_file(path: impl AsRef<Path>) -> Result<RunSummary, PipelineError> {
    Pipeline::new(PipelineConfig::from_json_file(path)?)?.run()
}
