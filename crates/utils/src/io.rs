//! CSV persistence for frames and wide panels.
//!
//! Wide panel files carry the entity identifier in the first column and one
//! column per period, labelled `YYYY-MM-DD`. Missing cells are written empty.

use std::{fs::File, path::Path};

use fundpanel_primitives::{EntityId, Period, WidePanel};
use ndarray::Array2;
use polars::prelude::*;
use tracing::{debug, info, warn};

use crate::{
    UtilsError,
    column::{f64_values, string_values},
    format_period, parse_period,
};

fn ensure_exists(path: &Path) -> Result<(), UtilsError> {
    if path.exists() { Ok(()) } else { Err(UtilsError::MissingFile(path.to_path_buf())) }
}

fn read_csv(path: &Path, infer_schema_length: Option<usize>) -> Result<DataFrame, UtilsError> {
    ensure_exists(path)?;
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(infer_schema_length)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    debug!(path = %path.display(), rows = df.height(), cols = df.width(), "read csv");
    Ok(df)
}

/// Read a CSV file with column types inferred over every row.
///
/// # Errors
/// Returns `UtilsError::MissingFile` if `path` does not exist, or a polars
/// error if the file cannot be parsed.
pub fn read_frame_csv(path: impl AsRef<Path>) -> Result<DataFrame, UtilsError> {
    read_csv(path.as_ref(), None)
}

/// Read a long fundamentals table with every column as text.
///
/// Values are coerced per cell when pivoted, so a stray malformed or
/// fractional value drops one row instead of failing the whole file.
///
/// # Errors
/// Returns `UtilsError::MissingFile` if `path` does not exist, or a polars
/// error if the file cannot be parsed.
pub fn read_long_csv(path: impl AsRef<Path>) -> Result<DataFrame, UtilsError> {
    read_csv(path.as_ref(), Some(0))
}

/// Read a wide panel CSV file.
///
/// # Errors
/// Returns `UtilsError::MissingFile` if `path` does not exist, or any error
/// from [`frame_to_panel`].
pub fn read_panel_csv(path: impl AsRef<Path>) -> Result<WidePanel, UtilsError> {
    let path = path.as_ref();
    // Every column as text so identifiers like `000001.SZ` survive intact.
    let df = read_csv(path, Some(0))?;
    let panel = frame_to_panel(&df)?;
    info!(
        path = %path.display(),
        entities = panel.n_entities(),
        periods = panel.n_periods(),
        "loaded panel"
    );
    Ok(panel)
}

/// Write a frame as CSV, creating parent directories.
///
/// # Errors
/// Returns an I/O or polars error if the file cannot be written.
pub fn write_frame_csv(df: &DataFrame, path: impl AsRef<Path>) -> Result<(), UtilsError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    let mut df = df.clone();
    CsvWriter::new(&mut file).include_header(true).finish(&mut df)?;
    debug!(path = %path.display(), rows = df.height(), "wrote csv");
    Ok(())
}

/// Write a wide panel as CSV with an `entity` first column.
///
/// # Errors
/// Returns an I/O or polars error if the file cannot be written.
pub fn write_panel_csv(panel: &WidePanel, path: impl AsRef<Path>) -> Result<(), UtilsError> {
    let path = path.as_ref();
    write_frame_csv(&panel_to_frame(panel, "entity")?, path)?;
    info!(
        path = %path.display(),
        entities = panel.n_entities(),
        periods = panel.n_periods(),
        "saved panel"
    );
    Ok(())
}

/// Convert a panel to a frame: one identifier column then one `Float64`
/// column per period. `NaN` cells become nulls.
///
/// # Errors
/// Returns a polars error if the frame cannot be assembled.
pub fn panel_to_frame(panel: &WidePanel, entity_col: &str) -> Result<DataFrame, UtilsError> {
    let mut columns = Vec::with_capacity(panel.n_periods() + 1);
    let ids: Vec<&str> = panel.entities().iter().map(EntityId::as_str).collect();
    columns.push(Column::new(entity_col.into(), ids));

    for (j, period) in panel.periods().iter().enumerate() {
        let values: Vec<Option<f64>> =
            panel.column(j).iter().map(|v| if v.is_nan() { None } else { Some(*v) }).collect();
        columns.push(Column::new(format_period(*period).into(), values));
    }

    Ok(DataFrame::new(columns)?)
}

/// Convert a wide frame back to a panel.
///
/// The first column holds entity identifiers. Remaining columns whose header
/// parses as a date become periods, reordered ascending; other columns are
/// skipped. Rows without an identifier are dropped.
///
/// # Errors
/// Returns `UtilsError::InvalidParameter` if the frame has no columns or two
/// headers name the same period, and `UtilsError::Panel` on duplicate
/// entities.
pub fn frame_to_panel(df: &DataFrame) -> Result<WidePanel, UtilsError> {
    let columns = df.get_columns();
    let Some((id_column, value_columns)) = columns.split_first() else {
        return Err(UtilsError::InvalidParameter("frame has no columns".to_string()));
    };

    let mut dated: Vec<(Period, &Column)> = Vec::with_capacity(value_columns.len());
    for column in value_columns {
        match parse_period(column.name()) {
            Some(period) => dated.push((period, column)),
            None => warn!(column = %column.name(), "skipping non-period column"),
        }
    }
    dated.sort_by_key(|(period, _)| *period);
    if let Some(pair) = dated.windows(2).find(|w| w[0].0 == w[1].0) {
        return Err(UtilsError::InvalidParameter(format!(
            "duplicate period column {}",
            format_period(pair[0].0)
        )));
    }

    let ids = string_values(id_column)?;
    let keep: Vec<usize> =
        ids.iter().enumerate().filter_map(|(i, id)| id.as_ref().map(|_| i)).collect();
    if keep.len() < ids.len() {
        warn!(dropped = ids.len() - keep.len(), "dropping rows without entity identifier");
    }

    let mut values = Array2::from_elem((keep.len(), dated.len()), f64::NAN);
    for (j, (_, column)) in dated.iter().enumerate() {
        let parsed = f64_values(column)?;
        for (r, &i) in keep.iter().enumerate() {
            values[[r, j]] = parsed[i];
        }
    }

    let entities = ids.into_iter().flatten().map(EntityId::new).collect();
    let periods = dated.into_iter().map(|(period, _)| period).collect();
    Ok(WidePanel::new(entities, periods, values)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> Period {
        Period::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn frame_to_panel_reorders_periods() {
        let df = df! {
            "ts_code" => &["000001.SZ", "600000.SH"],
            "2023-06-30" => &[Some("2.0"), None],
            "note" => &["x", "y"],
            "2023-03-31" => &[Some("1.0"), Some("3.0")],
        }
        .unwrap();

        let panel = frame_to_panel(&df).unwrap();

        assert_eq!(panel.periods(), &[d(2023, 3, 31), d(2023, 6, 30)]);
        assert_eq!(panel.get("000001.SZ", d(2023, 6, 30)), Some(2.0));
        assert_eq!(panel.get("600000.SH", d(2023, 3, 31)), Some(3.0));
        assert_eq!(panel.get("600000.SH", d(2023, 6, 30)), None);
    }

    #[test]
    fn frame_to_panel_rejects_duplicate_periods() {
        let df = df! {
            "entity" => &["A"],
            "2023-03-31" => &[1.0],
            "20230331" => &[2.0],
        }
        .unwrap();

        assert!(matches!(frame_to_panel(&df), Err(UtilsError::InvalidParameter(_))));
    }

    #[test]
    fn frame_to_panel_rejects_duplicate_entities() {
        let df = df! { "entity" => &["A", "A"], "2023-03-31" => &[1.0, 2.0] }.unwrap();
        assert!(matches!(frame_to_panel(&df), Err(UtilsError::Panel(_))));
    }

    #[test]
    fn panel_to_frame_nulls_nan() {
        let panel = WidePanel::from_rows(
            vec!["A".into()],
            vec![d(2023, 3, 31), d(2023, 6, 30)],
            vec![vec![1.0, f64::NAN]],
        )
        .unwrap();

        let df = panel_to_frame(&panel, "entity").unwrap();
        assert_eq!(df.width(), 3);
        assert_eq!(df.column("2023-06-30").unwrap().null_count(), 1);

        let back = frame_to_panel(&df).unwrap();
        assert_eq!(back.get("A", d(2023, 3, 31)), Some(1.0));
        assert_eq!(back.get("A", d(2023, 6, 30)), None);
    }

    #[test]
    fn missing_file_is_reported() {
        let err = read_panel_csv("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, UtilsError::MissingFile(_)));
    }
}
