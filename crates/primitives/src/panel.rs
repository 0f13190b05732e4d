//! Wide panel type definitions.

use ndarray::{Array2, ArrayView1, Axis};

use crate::{EntityId, Period};

/// Errors raised when a panel is constructed from inconsistent parts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PanelError {
    /// Matrix shape does not match the labels.
    #[error("shape mismatch: labels are {entities}x{periods}, values are {rows}x{cols}")]
    ShapeMismatch {
        /// Number of entity labels.
        entities: usize,
        /// Number of period labels.
        periods: usize,
        /// Rows in the value matrix.
        rows: usize,
        /// Columns in the value matrix.
        cols: usize,
    },

    /// Periods are not strictly increasing.
    #[error("periods must be strictly increasing: {previous} is followed by {next}")]
    UnorderedPeriods {
        /// Earlier label.
        previous: Period,
        /// Label that breaks the ordering.
        next: Period,
    },

    /// An entity label appears more than once.
    #[error("duplicate entity: {0}")]
    DuplicateEntity(EntityId),
}

/// Entity x period matrix of a single indicator.
///
/// Rows are entities, columns are period-end dates in strictly increasing
/// order. Missing observations are stored as `NaN`; zero is a real value.
/// Every transformation returns a fresh panel rather than mutating its input.
#[derive(Debug, Clone, PartialEq)]
pub struct WidePanel {
    entities: Vec<EntityId>,
    periods: Vec<Period>,
    values: Array2<f64>,
}

impl WidePanel {
    /// Create a panel from labels and a value matrix.
    ///
    /// # Errors
    /// Returns `PanelError` if the shape disagrees with the labels, periods
    /// are not strictly increasing, or an entity is repeated.
    pub fn new(
        entities: Vec<EntityId>,
        periods: Vec<Period>,
        values: Array2<f64>,
    ) -> Result<Self, PanelError> {
        let (rows, cols) = values.dim();
        if rows != entities.len() || cols != periods.len() {
            return Err(PanelError::ShapeMismatch {
                entities: entities.len(),
                periods: periods.len(),
                rows,
                cols,
            });
        }

        if let Some(pair) = periods.windows(2).find(|w| w[0] >= w[1]) {
            return Err(PanelError::UnorderedPeriods { previous: pair[0], next: pair[1] });
        }

        let mut seen = std::collections::HashSet::with_capacity(entities.len());
        for entity in &entities {
            if !seen.insert(entity.as_str()) {
                return Err(PanelError::DuplicateEntity(entity.clone()));
            }
        }

        Ok(Self { entities, periods, values })
    }

    /// Create a panel from nested rows, one `Vec` per entity.
    ///
    /// # Errors
    /// Returns `PanelError` if any row length differs from the period count.
    pub fn from_rows(
        entities: Vec<EntityId>,
        periods: Vec<Period>,
        rows: Vec<Vec<f64>>,
    ) -> Result<Self, PanelError> {
        let n_periods = periods.len();
        if let Some(bad) = rows.iter().find(|r| r.len() != n_periods) {
            return Err(PanelError::ShapeMismatch {
                entities: entities.len(),
                periods: n_periods,
                rows: rows.len(),
                cols: bad.len(),
            });
        }
        let n_rows = rows.len();
        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        let values = Array2::from_shape_vec((n_rows, n_periods), flat).map_err(|_| {
            PanelError::ShapeMismatch {
                entities: entities.len(),
                periods: n_periods,
                rows: n_rows,
                cols: n_periods,
            }
        })?;
        Self::new(entities, periods, values)
    }

    /// Entity labels in row order.
    #[must_use]
    pub fn entities(&self) -> &[EntityId] {
        &self.entities
    }

    /// Period labels in column order.
    #[must_use]
    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    /// The value matrix.
    #[must_use]
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Number of entities.
    #[must_use]
    pub fn n_entities(&self) -> usize {
        self.entities.len()
    }

    /// Number of periods.
    #[must_use]
    pub fn n_periods(&self) -> usize {
        self.periods.len()
    }

    /// Check if the panel has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Row index of an entity.
    #[must_use]
    pub fn entity_index(&self, entity: &str) -> Option<usize> {
        self.entities.iter().position(|e| e.as_str() == entity)
    }

    /// Column index of a period.
    #[must_use]
    pub fn period_index(&self, period: Period) -> Option<usize> {
        self.periods.binary_search(&period).ok()
    }

    /// Values of one entity across all periods.
    #[must_use]
    pub fn row(&self, index: usize) -> ArrayView1<'_, f64> {
        self.values.index_axis(Axis(0), index)
    }

    /// Values of one period across all entities.
    #[must_use]
    pub fn column(&self, index: usize) -> ArrayView1<'_, f64> {
        self.values.index_axis(Axis(1), index)
    }

    /// Observed value for an (entity, period) cell; `None` for missing data
    /// or unknown labels.
    #[must_use]
    pub fn get(&self, entity: &str, period: Period) -> Option<f64> {
        let i = self.entity_index(entity)?;
        let j = self.period_index(period)?;
        let v = self.values[[i, j]];
        if v.is_nan() { None } else { Some(v) }
    }

    /// Number of non-missing cells.
    #[must_use]
    pub fn count_valid(&self) -> usize {
        self.values.iter().filter(|v| !v.is_nan()).count()
    }

    /// Build a new panel with the same labels and a replacement matrix.
    ///
    /// # Errors
    /// Returns `PanelError::ShapeMismatch` if `values` has a different shape.
    pub fn with_values(&self, values: Array2<f64>) -> Result<Self, PanelError> {
        Self::new(self.entities.clone(), self.periods.clone(), values)
    }

    /// Decompose into labels and matrix.
    #[must_use]
    pub fn into_parts(self) -> (Vec<EntityId>, Vec<Period>, Array2<f64>) {
        (self.entities, self.periods, self.values)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Period {
        Period::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample() -> WidePanel {
        WidePanel::new(
            vec!["A".into(), "B".into()],
            vec![date(2023, 3, 31), date(2023, 6, 30)],
            array![[1.0, f64::NAN], [3.0, 4.0]],
        )
        .unwrap()
    }

    #[test]
    fn panel_accessors() {
        let panel = sample();
        assert_eq!(panel.n_entities(), 2);
        assert_eq!(panel.n_periods(), 2);
        assert_eq!(panel.get("B", date(2023, 6, 30)), Some(4.0));
        assert_eq!(panel.get("A", date(2023, 6, 30)), None);
        assert_eq!(panel.get("C", date(2023, 6, 30)), None);
        assert_eq!(panel.count_valid(), 3);
        assert_eq!(panel.row(1).to_vec(), vec![3.0, 4.0]);
    }

    #[test]
    fn shape_mismatch_rejected() {
        let err = WidePanel::new(vec!["A".into()], vec![date(2023, 3, 31)], array![[1.0, 2.0]])
            .unwrap_err();
        assert!(matches!(err, PanelError::ShapeMismatch { .. }));
    }

    #[test]
    fn unordered_periods_rejected() {
        let err = WidePanel::new(
            vec!["A".into()],
            vec![date(2023, 6, 30), date(2023, 3, 31)],
            array![[1.0, 2.0]],
        )
        .unwrap_err();
        assert!(matches!(err, PanelError::UnorderedPeriods { .. }));
    }

    #[test]
    fn duplicate_entity_rejected() {
        let err = WidePanel::new(
            vec!["A".into(), "A".into()],
            vec![date(2023, 3, 31)],
            array![[1.0], [2.0]],
        )
        .unwrap_err();
        assert_eq!(err, PanelError::DuplicateEntity("A".into()));
    }

    #[test]
    fn from_rows_builds_matrix() {
        let panel = WidePanel::from_rows(
            vec!["A".into()],
            vec![date(2023, 3, 31), date(2023, 6, 30)],
            vec![vec![1.0, 2.0]],
        )
        .unwrap();
        assert_eq!(panel.values(), &array![[1.0, 2.0]]);

        let err = WidePanel::from_rows(
            vec!["A".into()],
            vec![date(2023, 3, 31), date(2023, 6, 30)],
            vec![vec![1.0]],
        );
        assert!(err.is_err());
    }

    #[test]
    fn with_values_keeps_labels() {
        let panel = sample();
        let doubled = panel.with_values(panel.values() * 2.0).unwrap();
        assert_eq!(doubled.entities(), panel.entities());
        assert_eq!(doubled.get("A", date(2023, 3, 31)), Some(2.0));
        // input untouched
        assert_eq!(panel.get("A", date(2023, 3, 31)), Some(1.0));
    }
}
