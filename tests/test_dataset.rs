//! Integration test: before/after dataset construction and scaling

use accident_zinb::dataset::{build_before_after, IS_AFTER_COLUMN};
use accident_zinb::preprocessing::{train_test_split, SplitConfig, StandardScaler};
use accident_zinb::utils::DataLoader;
use accident_zinb::ZinbError;
use ndarray::{Array2, Axis};
use polars::prelude::*;

fn segments_df() -> DataFrame {
    df!(
        "FID" => &[1i64, 2, 3, 4, 5],
        "ROADNAME" => &["A", "B", "C", "D", "E"],
        "SPEED" => &[30.0, 50.0, 60.0, 80.0, 100.0],
        "LANES" => &[1i64, 2, 2, 3, 4],
        "ACCIDENTS" => &[3i64, 1, 0, 2, 5],
        "ACCIDENTS_BEFOREINSTALLATION_VERSION1" => &[2i64, 0, 0, 1, 4],
        "ACCIDENTS_AFTERINSTALLATION_VERSION1" => &[1i64, 1, 0, 1, 1],
        "ACCIDENTS_BEFOREINSTALLATION_VERSION2" => &[0i64, 0, 1, 0, 3]
    )
    .unwrap()
}

#[test]
fn test_stacks_before_then_after() {
    let df = segments_df();
    let dataset = build_before_after(&df, "VERSION1").unwrap();

    assert_eq!(dataset.n_source_rows, 5);
    assert_eq!(dataset.features.n_rows(), 10);
    assert_eq!(dataset.targets.len(), 10);
    assert_eq!(
        dataset.features.names(),
        &["SPEED".to_string(), "LANES".to_string(), IS_AFTER_COLUMN.to_string()]
    );

    let x = dataset.features.values();
    let flag = dataset.features.column_index(IS_AFTER_COLUMN).unwrap();
    for row in 0..5 {
        assert_eq!(x[[row, flag]], 0.0);
        assert_eq!(x[[row + 5, flag]], 1.0);
        // Both copies carry the same segment attributes
        assert_eq!(x[[row, 0]], x[[row + 5, 0]]);
    }

    let y = dataset.targets.values();
    assert_eq!(y.to_vec(), vec![2.0, 0.0, 0.0, 1.0, 4.0, 1.0, 1.0, 0.0, 1.0, 1.0]);
    assert!((dataset.targets.zero_fraction() - 0.3).abs() < 1e-12);
}

#[test]
fn test_missing_after_column_is_named() {
    let df = segments_df().drop("ACCIDENTS_AFTERINSTALLATION_VERSION1").unwrap();
    match build_before_after(&df, "VERSION1") {
        Err(ZinbError::SchemaError { version, missing }) => {
            assert_eq!(version, "VERSION1");
            assert_eq!(missing, vec!["ACCIDENTS_AFTERINSTALLATION_VERSION1".to_string()]);
        }
        other => panic!("expected schema error, got {:?}", other),
    }
}

#[test]
fn test_version_with_only_before_column_fails() {
    let df = segments_df();
    let err = build_before_after(&df, "VERSION2").unwrap_err();
    assert!(err.to_string().contains("ACCIDENTS_AFTERINSTALLATION_VERSION2"));
}

#[test]
fn test_standardizer_fits_train_only() {
    let df = segments_df();
    let dataset = build_before_after(&df, "VERSION1").unwrap();
    let split = train_test_split(
        dataset.features.n_rows(),
        &SplitConfig { test_size: 0.3, seed: 11 },
    )
    .unwrap();
    let (x_train, x_test, _, _) = split.apply(dataset.features.values(), dataset.targets.values());

    let mut scaler = StandardScaler::new();
    let z_train = scaler.fit_transform(&x_train).unwrap();
    let params_after_fit = scaler.params().to_vec();

    for column in z_train.axis_iter(Axis(1)) {
        let n = column.len() as f64;
        let mean = column.sum() / n;
        let std = (column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();
        assert!(mean.abs() < 1e-9);
        // Constant training columns map to zero instead of unit variance
        assert!((std - 1.0).abs() < 1e-9 || std < 1e-12);
    }

    let _ = scaler.transform(&x_test).unwrap();
    assert_eq!(scaler.params(), params_after_fit.as_slice());
}

#[test]
fn test_constant_column_maps_to_zero() {
    let x = Array2::from_shape_vec((3, 2), vec![1.0, 5.0, 2.0, 5.0, 3.0, 5.0]).unwrap();
    let mut scaler = StandardScaler::new();
    let z = scaler.fit_transform(&x).unwrap();
    assert!(z.column(1).iter().all(|v| *v == 0.0));
    assert_eq!(scaler.params()[1].scale, 1.0);
}

#[test]
fn test_segments_workbook_builds_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("segments.xlsx");

    let header = [
        "FID",
        "ROADNAME",
        "SPEED",
        "ACCIDENTS_BEFOREINSTALLATION_VERSION1",
        "ACCIDENTS_AFTERINSTALLATION_VERSION1",
    ];
    let rows = [
        ("A", [1.0, 30.0, 2.0, 0.0]),
        ("B", [2.0, 50.0, 0.0, 1.0]),
        ("C", [3.0, 80.0, 4.0, 3.0]),
    ];

    let mut workbook = rust_xlsxwriter::Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, name) in header.iter().enumerate() {
        sheet.write_string(0, col as u16, *name).unwrap();
    }
    for (r, (road, values)) in rows.iter().enumerate() {
        let row = r as u32 + 1;
        sheet.write_number(row, 0, values[0]).unwrap();
        sheet.write_string(row, 1, *road).unwrap();
        for (offset, value) in values[1..].iter().enumerate() {
            sheet.write_number(row, offset as u16 + 2, *value).unwrap();
        }
    }
    workbook.save(&path).unwrap();

    let df = DataLoader::new().load_auto(&path).unwrap();
    assert_eq!(df.shape(), (3, 5));

    let dataset = build_before_after(&df, "VERSION1").unwrap();
    assert_eq!(
        dataset.features.names(),
        &["SPEED".to_string(), IS_AFTER_COLUMN.to_string()]
    );
    assert_eq!(dataset.targets.values().to_vec(), vec![2.0, 0.0, 4.0, 0.0, 1.0, 3.0]);
    assert_eq!(dataset.features.values().column(0).to_vec(), vec![30.0, 50.0, 80.0, 30.0, 50.0, 80.0]);
}
