//! Window-averaged compound annual growth.

use fundpanel_primitives::GrowthEstimate;
use fundpanel_traits::GrowthEstimator;
use ndarray::{ArrayView1, s};
use serde::{Deserialize, Serialize};

use crate::GrowthError;

/// Configuration for the stable growth estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StableGrowthConfig {
    /// Report periods per year (4 for quarterly data).
    pub periods_per_year: usize,
    /// Number of most recent valid observations averaged for the end level.
    pub latest_window_size: usize,
    /// Half-width of the base-period window.
    pub base_window_half_size: usize,
    /// Valid observations a base window needs to qualify.
    pub min_periods_in_window: usize,
    /// Backward shifts tried before giving up on a base window.
    pub max_shift_attempts: usize,
}

impl Default for StableGrowthConfig {
    fn default() -> Self {
        Self {
            periods_per_year: 4,
            latest_window_size: 3,
            base_window_half_size: 2,
            min_periods_in_window: 3,
            max_shift_attempts: 6,
        }
    }
}

impl StableGrowthConfig {
    /// Check the window parameters for consistency.
    ///
    /// # Errors
    /// Returns `GrowthError::InvalidConfig` for zero sizes or a minimum
    /// that no base window can satisfy.
    pub fn validate(&self) -> Result<(), GrowthError> {
        if self.periods_per_year == 0 {
            return Err(GrowthError::InvalidConfig("periods_per_year must be positive".into()));
        }
        if self.latest_window_size == 0 {
            return Err(GrowthError::InvalidConfig("latest_window_size must be positive".into()));
        }
        if self.max_shift_attempts == 0 {
            return Err(GrowthError::InvalidConfig("max_shift_attempts must be positive".into()));
        }
        let width = 2 * self.base_window_half_size + 1;
        if self.min_periods_in_window == 0 || self.min_periods_in_window > width {
            return Err(GrowthError::InvalidConfig(format!(
                "min_periods_in_window must be in 1..={width}, got {}",
                self.min_periods_in_window
            )));
        }
        Ok(())
    }
}

/// Compound annual growth between a base-period window and the latest
/// observations.
///
/// Averaging both ends over a window damps single noisy reports. The base
/// window is centred `target_years` before the last valid observation and
/// slides backward while it holds too few observations. The compounding span
/// runs from the last valid observation of the base window to the last valid
/// observation of the series, floored at one year.
#[derive(Debug, Clone, Default)]
pub struct StableGrowthEstimator {
    config: StableGrowthConfig,
}

impl StableGrowthEstimator {
    /// Create a new estimator with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mean of the last `latest_window_size` valid observations, with the
    /// position of the latest one.
    fn trailing(&self, series: ArrayView1<'_, f64>) -> Option<(usize, f64)> {
        let n = self.config.latest_window_size;
        let latest: Vec<(usize, f64)> = series
            .iter()
            .copied()
            .enumerate()
            .rev()
            .filter(|(_, v)| v.is_finite())
            .take(n)
            .collect();
        if latest.len() < n {
            return None;
        }
        let end = latest[0].0;
        let mean = latest.iter().map(|(_, v)| v).sum::<f64>() / n as f64;
        Some((end, mean))
    }

    /// First qualifying base window as `(last valid position, mean)`.
    fn base(
        &self,
        series: ArrayView1<'_, f64>,
        end: usize,
        lookback: usize,
    ) -> Option<(usize, f64)> {
        let h = self.config.base_window_half_size;
        for shift in 0..self.config.max_shift_attempts {
            let Some(centre) = end.checked_sub(lookback + shift) else {
                break;
            };
            let Some(start) = centre.checked_sub(h) else {
                break;
            };
            let stop = centre + h;
            if stop >= series.len() {
                continue;
            }

            let valid: Vec<(usize, f64)> = series
                .slice(s![start..=stop])
                .iter()
                .copied()
                .enumerate()
                .filter(|(_, v)| v.is_finite())
                .collect();
            if let Some(&(last, _)) = valid.last()
                && valid.len() >= self.config.min_periods_in_window
            {
                let mean = valid.iter().map(|(_, v)| v).sum::<f64>() / valid.len() as f64;
                return Some((start + last, mean));
            }
        }
        None
    }
}

impl GrowthEstimator for StableGrowthEstimator {
    type Config = StableGrowthConfig;

    fn with_config(config: Self::Config) -> Self {
        Self { config }
    }

    fn config(&self) -> &Self::Config {
        &self.config
    }

    fn estimate(&self, series: ArrayView1<'_, f64>, target_years: u32) -> GrowthEstimate {
        let ppy = self.config.periods_per_year;
        if target_years == 0 || ppy == 0 || self.config.latest_window_size == 0 {
            return GrowthEstimate::Undefined;
        }
        let Some((end, trailing)) = self.trailing(series) else {
            return GrowthEstimate::Undefined;
        };
        let Some((anchor, base)) = self.base(series, end, target_years as usize * ppy) else {
            return GrowthEstimate::Undefined;
        };

        if base <= 0.0 || trailing <= 0.0 {
            return GrowthEstimate::Degenerate;
        }

        let years = ((end - anchor) as f64 / ppy as f64).max(1.0);
        let rate = (trailing / base).powf(1.0 / years) - 1.0;
        if rate.is_finite() { GrowthEstimate::Value(rate) } else { GrowthEstimate::Undefined }
    }

    fn name(&self) -> &str {
        "stable_growth"
    }
}
