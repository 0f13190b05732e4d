//! Growth estimation trait definitions.

use fundpanel_primitives::GrowthEstimate;
use ndarray::ArrayView1;

/// Per-entity growth rate estimation over a lookback horizon.
pub trait GrowthEstimator: Send + Sync {
    /// Configuration type for this estimator.
    type Config: Default + Clone + Send + Sync;

    /// Create a new estimator with the given configuration.
    fn with_config(config: Self::Config) -> Self;

    /// Returns the estimator configuration.
    fn config(&self) -> &Self::Config;

    /// Estimate annualized growth of one entity's period series.
    ///
    /// `series` is ordered by period with gaps as `NaN`.
    fn estimate(&self, series: ArrayView1<'_, f64>, target_years: u32) -> GrowthEstimate;

    /// Returns the name of this estimator.
    fn name(&self) -> &str;
}
