//! File round trips for panels and long tables.

use std::fs;

use fundpanel_primitives::{EntityId, Period, WidePanel};
use fundpanel_utils::{
    LongLayout, UtilsError, pivot_wide, read_frame_csv, read_long_csv, read_panel_csv,
    write_panel_csv,
};

fn d(y: i32, m: u32, day: u32) -> Period {
    Period::from_ymd_opt(y, m, day).unwrap()
}

#[test]
fn panel_survives_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("fcfe_ta.csv");

    let panel = WidePanel::from_rows(
        vec!["000001.SZ".into(), "600000.SH".into()],
        vec![d(2023, 3, 31), d(2023, 6, 30), d(2023, 9, 30)],
        vec![vec![0.1, f64::NAN, -0.25], vec![1e-3, 2.5, 0.0]],
    )
    .unwrap();

    write_panel_csv(&panel, &path).unwrap();
    let loaded = read_panel_csv(&path).unwrap();

    assert_eq!(loaded.entities(), panel.entities());
    assert_eq!(loaded.periods(), panel.periods());
    for (a, b) in loaded.values().iter().zip(panel.values().iter()) {
        assert!((a.is_nan() && b.is_nan()) || a == b);
    }
}

#[test]
fn empty_cells_load_as_missing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wide.csv");
    fs::write(&path, "ts_code,20230630,20230331\n000001.SZ,,1.5\n600000.SH,2,\n").unwrap();

    let panel = read_panel_csv(&path).unwrap();

    assert_eq!(panel.periods(), &[d(2023, 3, 31), d(2023, 6, 30)]);
    assert_eq!(panel.get("000001.SZ", d(2023, 3, 31)), Some(1.5));
    assert_eq!(panel.get("000001.SZ", d(2023, 6, 30)), None);
    assert_eq!(panel.get("600000.SH", d(2023, 6, 30)), Some(2.0));
    assert_eq!(panel.count_valid(), 2);
}

#[test]
fn long_file_pivots() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roe.csv");
    fs::write(
        &path,
        "ts_code,ann_date,end_date,q_roe\n\
         600000.SH,20230428,20230331,1.2\n\
         000001.SZ,20230428,20230331,0.8\n\
         000001.SZ,20230825,20230630,\n\
         000001.SZ,20230826,20230630,0.9\n",
    )
    .unwrap();

    let df = read_long_csv(&path).unwrap();
    let panel = pivot_wide(&df, &LongLayout::default(), "q_roe").unwrap();

    assert_eq!(panel.entities(), &[EntityId::from("000001.SZ"), EntityId::from("600000.SH")]);
    assert_eq!(panel.get("000001.SZ", d(2023, 6, 30)), Some(0.9));
    assert_eq!(panel.get("600000.SH", d(2023, 6, 30)), None);
}

fn integers_then_fraction(dir: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("fina_indicator.csv");
    let mut body = String::from("ts_code,end_date,fcfe\n");
    for i in 0..150 {
        body.push_str(&format!("E{i:03}.SZ,20231231,{i}\n"));
    }
    body.push_str("X.SZ,20231231,1.5\nY.SZ,20231231,n/a\n");
    fs::write(&path, body).unwrap();
    path
}

#[test]
fn late_fraction_in_integer_column_loads() {
    let dir = tempfile::tempdir().unwrap();
    let path = integers_then_fraction(dir.path());

    let df = read_long_csv(&path).unwrap();
    let panel = pivot_wide(&df, &LongLayout::default(), "fcfe").unwrap();

    assert_eq!(panel.n_entities(), 151);
    assert_eq!(panel.get("E007.SZ", d(2023, 12, 31)), Some(7.0));
    assert_eq!(panel.get("X.SZ", d(2023, 12, 31)), Some(1.5));
    assert_eq!(panel.entity_index("Y.SZ"), None);
}

#[test]
fn frame_types_are_inferred_from_every_row() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("table.csv");
    let mut body = String::from("code,score\n");
    for i in 0..150 {
        body.push_str(&format!("E{i},{i}\n"));
    }
    body.push_str("X,1.5\n");
    fs::write(&path, body).unwrap();

    let df = read_frame_csv(&path).unwrap();

    assert_eq!(df.height(), 151);
    let score: Vec<Option<f64>> = df.column("score").unwrap().f64().unwrap().into_iter().collect();
    assert_eq!(score[150], Some(1.5));
}

#[test]
fn missing_input_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = read_frame_csv(dir.path().join("absent.csv")).unwrap_err();
    assert!(matches!(err, UtilsError::MissingFile(_)));
}
