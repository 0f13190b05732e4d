//! Composite growth score output.

use fundpanel_primitives::{EntityId, GrowthEstimate};
use polars::prelude::*;

use crate::GrowthError;

/// Scores of one retained entity.
#[derive(Debug, Clone, PartialEq)]
pub struct GrowthScoreRow {
    /// Entity identifier.
    pub entity: EntityId,
    /// Growth estimate per horizon, in horizon order.
    pub estimates: Vec<GrowthEstimate>,
    /// Per-horizon z-score, missing horizons filled with zero.
    pub zscores: Vec<f64>,
    /// Re-standardized mean of the per-horizon z-scores.
    pub composite: f64,
}

/// Composite growth scores sorted by descending composite.
#[derive(Debug, Clone, PartialEq)]
pub struct GrowthScoreTable {
    prefix: String,
    horizons: Vec<u32>,
    rows: Vec<GrowthScoreRow>,
}

impl GrowthScoreTable {
    pub(crate) fn new(prefix: String, horizons: Vec<u32>, rows: Vec<GrowthScoreRow>) -> Self {
        Self { prefix, horizons, rows }
    }

    /// Factor prefix used for column names.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Lookback horizons in years.
    #[must_use]
    pub fn horizons(&self) -> &[u32] {
        &self.horizons
    }

    /// Rows, highest composite first.
    #[must_use]
    pub fn rows(&self) -> &[GrowthScoreRow] {
        &self.rows
    }

    /// Number of retained entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no entity was retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row for `entity`, if retained.
    #[must_use]
    pub fn get(&self, entity: &str) -> Option<&GrowthScoreRow> {
        self.rows.iter().find(|row| row.entity.as_str() == entity)
    }

    /// Name of the composite score column.
    #[must_use]
    pub fn composite_column(&self) -> String {
        format!("composite_{}_growth_score", self.prefix)
    }

    /// Render the table as a frame.
    ///
    /// Columns are `entity`, then per horizon `{prefix}_cagr_{y}yr`,
    /// `{prefix}_cagr_{y}yr_status` and `{prefix}_zscore_{y}yr`, then the
    /// composite score. Non-numeric estimates leave the CAGR cell null.
    ///
    /// # Errors
    /// Returns a polars error if the frame cannot be assembled.
    pub fn to_frame(&self) -> Result<DataFrame, GrowthError> {
        let mut columns = Vec::with_capacity(3 * self.horizons.len() + 2);
        let ids: Vec<&str> = self.rows.iter().map(|row| row.entity.as_str()).collect();
        columns.push(Column::new("entity".into(), ids));

        for (k, years) in self.horizons.iter().enumerate() {
            let cagr_name = format!("{}_cagr_{years}yr", self.prefix);
            let cagr: Vec<Option<f64>> =
                self.rows.iter().map(|row| row.estimates[k].value()).collect();
            let status: Vec<&str> = self.rows.iter().map(|row| row.estimates[k].status()).collect();
            let zscore: Vec<f64> = self.rows.iter().map(|row| row.zscores[k]).collect();

            columns.push(Column::new(cagr_name.as_str().into(), cagr));
            columns.push(Column::new(format!("{cagr_name}_status").into(), status));
            columns.push(Column::new(format!("{}_zscore_{years}yr", self.prefix).into(), zscore));
        }

        let composite: Vec<f64> = self.rows.iter().map(|row| row.composite).collect();
        columns.push(Column::new(self.composite_column().into(), composite));

        Ok(DataFrame::new(columns)?)
    }
}
