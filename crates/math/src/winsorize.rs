//! Winsorization operations for outlier handling.

use fundpanel_primitives::WidePanel;
use fundpanel_traits::{PanelTransform, TransformError};
use ndarray::{Array1, ArrayViewMut1, Axis};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::MathError;

/// Check a (lower, upper) quantile pair.
///
/// # Errors
/// Returns `MathError::InvalidQuantiles` unless `0 <= lower < upper <= 1`.
pub fn validate_quantiles(lower: f64, upper: f64) -> Result<(), MathError> {
    let in_range = |q: f64| (0.0..=1.0).contains(&q);
    if !in_range(lower) || !in_range(upper) || lower >= upper {
        return Err(MathError::InvalidQuantiles { lower, upper });
    }
    Ok(())
}

/// Order-statistic bounds of the finite values, or `None` if there are none.
///
/// The bounds are actual observations, so clipping to them and recomputing
/// yields the same bounds.
fn quantile_bounds(
    values: impl Iterator<Item = f64>,
    lower: f64,
    upper: f64,
) -> Option<(f64, f64)> {
    let mut sorted: Vec<f64> = values.filter(|x| x.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len();
    let lower_idx = (((n as f64) * lower).floor() as usize).min(n - 1);
    let upper_idx =
        (((n as f64) * upper).ceil() as usize).saturating_sub(1).min(n - 1).max(lower_idx);

    Some((sorted[lower_idx], sorted[upper_idx]))
}

fn clip_lane(mut lane: ArrayViewMut1<'_, f64>, lower: f64, upper: f64) {
    if let Some((lo, hi)) = quantile_bounds(lane.iter().copied(), lower, upper) {
        lane.mapv_inplace(|x| if x.is_nan() { x } else { x.clamp(lo, hi) });
    }
}

/// Winsorize a 1D array to the given quantiles.
///
/// Values below the lower quantile are raised to it, values above the upper
/// quantile are lowered to it. `NaN` entries stay `NaN` and do not take part
/// in the bound computation.
///
/// # Errors
/// Returns `MathError::InvalidQuantiles` if the pair is not valid.
pub fn winsorize(data: &Array1<f64>, lower: f64, upper: f64) -> Result<Array1<f64>, MathError> {
    validate_quantiles(lower, upper)?;

    let mut out = data.clone();
    clip_lane(out.view_mut(), lower, upper);
    Ok(out)
}

/// Direction along which panel bounds are computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinsorAxis {
    /// Bounds per period, across entities.
    #[default]
    Columns,
    /// Bounds per entity, across periods.
    Rows,
}

/// Winsorize a panel column-wise or row-wise.
///
/// Lanes with no observed values pass through unchanged. The result has the
/// same labels as the input.
///
/// # Errors
/// Returns `MathError::InvalidQuantiles` if the pair is not valid.
pub fn winsorize_panel(
    panel: &WidePanel,
    lower: f64,
    upper: f64,
    axis: WinsorAxis,
) -> Result<WidePanel, MathError> {
    validate_quantiles(lower, upper)?;

    // lanes along Axis(0) are columns
    let lane_axis = match axis {
        WinsorAxis::Columns => Axis(0),
        WinsorAxis::Rows => Axis(1),
    };

    let mut values = panel.values().clone();
    for lane in values.lanes_mut(lane_axis) {
        clip_lane(lane, lower, upper);
    }

    Ok(panel.with_values(values)?)
}

fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Float32
            | DataType::Float64
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt32
            | DataType::UInt64
    )
}

/// Winsorize every numeric column of a table.
///
/// Numeric columns are clipped to their own quantile bounds and emitted as
/// `Float64`; other columns are passed through untouched. Column order and
/// row order are preserved.
///
/// # Errors
/// Returns `MathError::InvalidQuantiles` for a bad pair, or a polars error if
/// a column cannot be cast.
pub fn winsorize_frame(df: &DataFrame, lower: f64, upper: f64) -> Result<DataFrame, MathError> {
    validate_quantiles(lower, upper)?;

    let mut columns = Vec::with_capacity(df.width());
    for column in df.get_columns() {
        if !is_numeric(column.dtype()) {
            debug!(column = %column.name(), dtype = %column.dtype(), "skipping non-numeric column");
            columns.push(column.clone());
            continue;
        }

        let values: Vec<Option<f64>> =
            column.cast(&DataType::Float64)?.f64()?.into_iter().collect();

        let clipped: Vec<Option<f64>> =
            match quantile_bounds(values.iter().flatten().copied(), lower, upper) {
                Some((lo, hi)) => values
                    .iter()
                    .map(|v| v.map(|x| if x.is_nan() { x } else { x.clamp(lo, hi) }))
                    .collect(),
                None => values,
            };

        columns.push(Column::new(column.name().clone(), clipped));
    }

    Ok(DataFrame::new(columns)?)
}

/// Winsorization configuration and transform.
#[derive(Debug, Clone)]
pub struct Winsorizer {
    lower: f64,
    upper: f64,
    axis: WinsorAxis,
}

impl Winsorizer {
    /// Create a new column-wise winsorizer.
    ///
    /// # Errors
    /// Returns `MathError::InvalidQuantiles` if the pair is not valid.
    pub fn new(lower: f64, upper: f64) -> Result<Self, MathError> {
        Self::with_axis(lower, upper, WinsorAxis::Columns)
    }

    /// Create a new winsorizer along the given axis.
    ///
    /// # Errors
    /// Returns `MathError::InvalidQuantiles` if the pair is not valid.
    pub fn with_axis(lower: f64, upper: f64, axis: WinsorAxis) -> Result<Self, MathError> {
        validate_quantiles(lower, upper)?;
        Ok(Self { lower, upper, axis })
    }

    /// Symmetric winsorizer clipping `percentile` from each tail.
    ///
    /// # Errors
    /// Returns `MathError::InvalidQuantiles` unless `percentile` is in [0, 0.5).
    pub fn symmetric(percentile: f64) -> Result<Self, MathError> {
        Self::new(percentile, 1.0 - percentile)
    }

    /// Lower quantile.
    #[must_use]
    pub const fn lower(&self) -> f64 {
        self.lower
    }

    /// Upper quantile.
    #[must_use]
    pub const fn upper(&self) -> f64 {
        self.upper
    }

    /// Axis along which bounds are computed.
    #[must_use]
    pub const fn axis(&self) -> WinsorAxis {
        self.axis
    }

    /// Apply winsorization to an array.
    ///
    /// # Errors
    /// Returns error if winsorization fails.
    pub fn apply(&self, data: &Array1<f64>) -> Result<Array1<f64>, MathError> {
        winsorize(data, self.lower, self.upper)
    }

    /// Apply winsorization to a panel.
    ///
    /// # Errors
    /// Returns error if the output panel cannot be assembled.
    pub fn apply_panel(&self, panel: &WidePanel) -> Result<WidePanel, MathError> {
        winsorize_panel(panel, self.lower, self.upper, self.axis)
    }
}

impl PanelTransform for Winsorizer {
    fn transform(&self, panel: &WidePanel) -> Result<WidePanel, TransformError> {
        self.apply_panel(panel).map_err(|e| TransformError::Numerical(e.to_string()))
    }

    fn name(&self) -> &str {
        match self.axis {
            WinsorAxis::Columns => "winsorize_columns",
            WinsorAxis::Rows => "winsorize_rows",
        }
    }
}
