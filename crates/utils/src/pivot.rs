//! Long-to-wide reshaping.

use std::collections::{BTreeMap, BTreeSet};

use fundpanel_primitives::{EntityId, FundamentalRecord, Period, WidePanel};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    UtilsError,
    column::{f64_values, require, string_values},
    format_period, parse_period,
};

/// Column names of a long-format fundamentals table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LongLayout {
    /// Entity identifier column.
    pub entity_col: String,
    /// Period-end date column.
    pub period_col: String,
    /// Field-name column of tidy `(entity, period, field, value)` tables.
    pub field_col: String,
    /// Value column of tidy tables.
    pub value_col: String,
}

impl Default for LongLayout {
    fn default() -> Self {
        Self {
            entity_col: "ts_code".to_string(),
            period_col: "end_date".to_string(),
            field_col: "field".to_string(),
            value_col: "value".to_string(),
        }
    }
}

impl LongLayout {
    /// Layout used for exported record files.
    #[must_use]
    pub fn records() -> Self {
        Self {
            entity_col: "entity".to_string(),
            period_col: "period".to_string(),
            ..Self::default()
        }
    }
}

/// Pivot one value column of a long table into a wide panel.
///
/// Rows with a missing entity, an unparsable period or a missing value are
/// dropped. Duplicate (entity, period) pairs keep the last row. Entities and
/// periods are sorted ascending.
///
/// # Errors
/// Returns `UtilsError::MissingColumn` if a required column is absent.
pub fn pivot_wide(
    df: &DataFrame,
    layout: &LongLayout,
    value_col: &str,
) -> Result<WidePanel, UtilsError> {
    let entities = string_values(require(df, &layout.entity_col)?)?;
    let periods = string_values(require(df, &layout.period_col)?)?;
    let values = f64_values(require(df, value_col)?)?;

    let mut cells: BTreeMap<EntityId, BTreeMap<Period, f64>> = BTreeMap::new();
    let mut axis: BTreeSet<Period> = BTreeSet::new();
    let mut dropped = 0usize;

    for ((entity, period), value) in entities.into_iter().zip(periods).zip(values) {
        let (Some(entity), Some(period)) = (entity, period.as_deref().and_then(parse_period))
        else {
            dropped += 1;
            continue;
        };
        if value.is_nan() {
            dropped += 1;
            continue;
        }
        axis.insert(period);
        cells.entry(EntityId::new(entity)).or_default().insert(period, value);
    }

    let axis: Vec<Period> = axis.into_iter().collect();
    let mut matrix = Array2::from_elem((cells.len(), axis.len()), f64::NAN);
    for (i, row) in cells.values().enumerate() {
        for (period, value) in row {
            if let Ok(j) = axis.binary_search(period) {
                matrix[[i, j]] = *value;
            }
        }
    }

    info!(
        value = value_col,
        rows = df.height(),
        dropped,
        entities = cells.len(),
        periods = axis.len(),
        "pivoted long table to wide panel"
    );

    Ok(WidePanel::new(cells.into_keys().collect(), axis, matrix)?)
}

/// Pivot one field of a tidy `(entity, period, field, value)` table.
///
/// # Errors
/// Returns `UtilsError::MissingColumn` if a layout column is absent.
pub fn pivot_field(
    df: &DataFrame,
    layout: &LongLayout,
    field: &str,
) -> Result<WidePanel, UtilsError> {
    require(df, &layout.field_col)?;
    let filtered =
        df.clone().lazy().filter(col(layout.field_col.as_str()).eq(lit(field))).collect()?;
    debug!(field, rows = filtered.height(), "selected field rows");
    pivot_wide(&filtered, layout, &layout.value_col)
}

/// Decode a tidy table into records; rows without entity or period are skipped.
///
/// # Errors
/// Returns `UtilsError::MissingColumn` if a layout column is absent.
pub fn frame_to_records(
    df: &DataFrame,
    layout: &LongLayout,
) -> Result<Vec<FundamentalRecord>, UtilsError> {
    let entities = string_values(require(df, &layout.entity_col)?)?;
    let periods = string_values(require(df, &layout.period_col)?)?;
    let fields = string_values(require(df, &layout.field_col)?)?;
    let values = f64_values(require(df, &layout.value_col)?)?;

    let records = entities
        .into_iter()
        .zip(periods)
        .zip(fields)
        .zip(values)
        .filter_map(|(((entity, period), field), value)| {
            let period = period.as_deref().and_then(parse_period)?;
            Some(FundamentalRecord::new(
                entity?,
                period,
                field?,
                if value.is_nan() { None } else { Some(value) },
            ))
        })
        .collect();
    Ok(records)
}

/// Encode records as a tidy table using `layout`'s column names.
///
/// # Errors
/// Returns a polars error if the frame cannot be assembled.
pub fn records_to_frame(
    records: &[FundamentalRecord],
    layout: &LongLayout,
) -> Result<DataFrame, UtilsError> {
    let entities: Vec<&str> = records.iter().map(|r| r.entity.as_str()).collect();
    let periods: Vec<String> = records.iter().map(|r| format_period(r.period)).collect();
    let fields: Vec<&str> = records.iter().map(|r| r.field.as_str()).collect();
    let values: Vec<Option<f64>> = records.iter().map(|r| r.value).collect();

    let df = DataFrame::new(vec![
        Column::new(layout.entity_col.as_str().into(), entities),
        Column::new(layout.period_col.as_str().into(), periods),
        Column::new(layout.field_col.as_str().into(), fields),
        Column::new(layout.value_col.as_str().into(), values),
    ])?;
    Ok(df)
}
