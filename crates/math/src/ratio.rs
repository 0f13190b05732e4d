//! Elementwise panel ratios.

use fundpanel_primitives::{EntityId, Period, WidePanel};
use ndarray::Array2;
use tracing::debug;

use crate::MathError;

/// Quotient that maps every indeterminate case to `NaN`.
///
/// Missing operands, a zero denominator and non-finite results all yield
/// `NaN`; no infinity ever escapes.
#[must_use]
pub fn safe_divide(numerator: f64, denominator: f64) -> f64 {
    if numerator.is_nan() || denominator.is_nan() || denominator == 0.0 {
        return f64::NAN;
    }
    let q = numerator / denominator;
    if q.is_finite() { q } else { f64::NAN }
}

/// Elementwise ratio of two panels over their common labels.
///
/// Entities keep the numerator's order; periods are the ascending
/// intersection of both panels' periods.
///
/// # Errors
/// Returns `MathError::EmptyData` if the panels share no entity or no period.
pub fn panel_ratio(
    numerator: &WidePanel,
    denominator: &WidePanel,
) -> Result<WidePanel, MathError> {
    let rows: Vec<(EntityId, usize, usize)> = numerator
        .entities()
        .iter()
        .enumerate()
        .filter_map(|(i, e)| denominator.entity_index(e.as_str()).map(|k| (e.clone(), i, k)))
        .collect();

    let cols: Vec<(Period, usize, usize)> = numerator
        .periods()
        .iter()
        .enumerate()
        .filter_map(|(j, p)| denominator.period_index(*p).map(|l| (*p, j, l)))
        .collect();

    if rows.is_empty() || cols.is_empty() {
        return Err(MathError::EmptyData);
    }

    debug!(
        entities = rows.len(),
        periods = cols.len(),
        dropped_entities = numerator.n_entities() - rows.len(),
        "aligned panels for ratio"
    );

    let num = numerator.values();
    let den = denominator.values();
    let values = Array2::from_shape_fn((rows.len(), cols.len()), |(r, c)| {
        let (_, i, k) = &rows[r];
        let (_, j, l) = &cols[c];
        safe_divide(num[[*i, *j]], den[[*k, *l]])
    });

    let entities = rows.into_iter().map(|(e, _, _)| e).collect();
    let periods = cols.into_iter().map(|(p, _, _)| p).collect();
    Ok(WidePanel::new(entities, periods, values)?)
}
