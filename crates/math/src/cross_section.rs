//! Cross-sectional statistical operations.

use std::collections::BTreeMap;

use ndarray::Array1;

use crate::MathError;

/// Mean and sample standard deviation (ddof = 1) of the finite entries.
///
/// Returns `None` when fewer than two finite values exist.
#[must_use]
pub fn finite_moments(data: &Array1<f64>) -> Option<(f64, f64)> {
    let finite: Vec<f64> = data.iter().copied().filter(|x| x.is_finite()).collect();
    let n = finite.len();
    if n < 2 {
        return None;
    }

    let mean = finite.iter().sum::<f64>() / n as f64;
    let variance = finite.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n as f64 - 1.0);
    Some((mean, variance.sqrt()))
}

/// Cross-sectional z-score of the finite entries.
///
/// Missing entries stay `NaN`. When fewer than two values are observed or
/// the dispersion is zero, every entry is `NaN`: no ranking exists.
#[must_use]
pub fn zscore(data: &Array1<f64>) -> Array1<f64> {
    match finite_moments(data) {
        Some((mean, std)) if std > 0.0 && std.is_finite() => {
            data.mapv(|x| if x.is_finite() { (x - mean) / std } else { f64::NAN })
        }
        _ => Array1::from_elem(data.len(), f64::NAN),
    }
}

/// Z-score `data` separately within each group.
///
/// A group is standardized when it has at least `min_group_size` finite
/// values and a positive dispersion. Other groups keep their raw values.
/// Missing entries stay `NaN`.
///
/// # Errors
/// Returns `MathError::DimensionMismatch` if `groups` and `data` differ in
/// length.
pub fn grouped_zscore<G: Ord>(
    data: &Array1<f64>,
    groups: &[G],
    min_group_size: usize,
) -> Result<Array1<f64>, MathError> {
    if groups.len() != data.len() {
        return Err(MathError::DimensionMismatch { expected: data.len(), actual: groups.len() });
    }

    let mut members: BTreeMap<&G, Vec<usize>> = BTreeMap::new();
    for (i, group) in groups.iter().enumerate() {
        members.entry(group).or_default().push(i);
    }

    let mut out = data.mapv(|x| if x.is_finite() { x } else { f64::NAN });
    for rows in members.values() {
        let values: Array1<f64> = rows.iter().map(|&i| out[i]).collect();
        let observed = values.iter().filter(|x| x.is_finite()).count();
        if observed < min_group_size.max(2) {
            continue;
        }
        if let Some((mean, std)) = finite_moments(&values)
            && std > 0.0
            && std.is_finite()
        {
            for &i in rows {
                out[i] = (out[i] - mean) / std;
            }
        }
    }
    Ok(out)
}
