//! Spot-check extracts of long tables.

use polars::prelude::*;
use tracing::info;

use crate::{
    LongLayout, UtilsError,
    column::{f64_values, require, string_values},
    format_period, parse_period,
};

/// Extract a tidy subset of a long table for manual inspection.
///
/// Keeps the entity and period columns plus `fields`, coerces the fields to
/// `Float64` (unparsable cells become null), drops rows with no entity or no
/// parsable period, and sorts by entity then period. Periods are rendered as
/// ISO dates.
///
/// # Errors
/// Returns `UtilsError::MissingColumn` if the entity, period or any requested
/// field column is absent.
pub fn inspection_frame(
    df: &DataFrame,
    layout: &LongLayout,
    fields: &[&str],
) -> Result<DataFrame, UtilsError> {
    let entities = string_values(require(df, &layout.entity_col)?)?;
    let periods: Vec<_> = string_values(require(df, &layout.period_col)?)?
        .into_iter()
        .map(|p| p.as_deref().and_then(parse_period))
        .collect();
    let values = fields
        .iter()
        .map(|f| f64_values(require(df, f)?))
        .collect::<Result<Vec<_>, _>>()?;

    let mut keep: Vec<usize> = (0..df.height())
        .filter(|&i| entities[i].is_some() && periods[i].is_some())
        .collect();
    keep.sort_by(|&a, &b| (&entities[a], periods[a]).cmp(&(&entities[b], periods[b])));

    let mut columns = Vec::with_capacity(fields.len() + 2);
    columns.push(Column::new(
        layout.entity_col.as_str().into(),
        keep.iter().map(|&i| entities[i].clone()).collect::<Vec<_>>(),
    ));
    columns.push(Column::new(
        layout.period_col.as_str().into(),
        keep.iter().map(|&i| periods[i].map(format_period)).collect::<Vec<_>>(),
    ));
    for (field, column) in fields.iter().zip(&values) {
        let cells: Vec<Option<f64>> =
            keep.iter().map(|&i| Some(column[i]).filter(|v| !v.is_nan())).collect();
        columns.push(Column::new((*field).into(), cells));
    }

    info!(
        rows = df.height(),
        kept = keep.len(),
        fields = fields.len(),
        "built inspection extract"
    );
    Ok(DataFrame::new(columns)?)
}
