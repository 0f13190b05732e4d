//! Column extraction helpers.

use polars::prelude::*;

use crate::UtilsError;

/// Look up a column, mapping absence to `UtilsError::MissingColumn`.
pub(crate) fn require<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column, UtilsError> {
    df.column(name).map_err(|_| UtilsError::MissingColumn(name.to_string()))
}

/// Column values rendered as trimmed strings; nulls and blanks are `None`.
pub(crate) fn string_values(column: &Column) -> Result<Vec<Option<String>>, UtilsError> {
    let as_str = column.cast(&DataType::String)?;
    let values = as_str
        .str()?
        .into_iter()
        .map(|v| v.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string))
        .collect();
    Ok(values)
}

/// Column values as `f64`, `NaN` for nulls and unparsable text.
pub(crate) fn f64_values(column: &Column) -> Result<Vec<f64>, UtilsError> {
    if column.dtype() == &DataType::String {
        let values = column
            .str()?
            .into_iter()
            .map(|v| v.and_then(|s| s.trim().parse::<f64>().ok()).unwrap_or(f64::NAN))
            .collect();
        return Ok(values);
    }

    let as_f64 = column.cast(&DataType::Float64)?;
    let values = as_f64.f64()?.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect();
    Ok(values)
}
