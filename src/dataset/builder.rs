//! Before/after dataset construction from a road-segment table

use ndarray::{concatenate, Array1, Array2, Axis};
use polars::prelude::*;
use tracing::debug;

use super::{FeatureMatrix, TargetVector};
use crate::error::{Result, ZinbError};

/// Name of the appended before/after indicator column
pub const IS_AFTER_COLUMN: &str = "Is_After";

/// Identifier, geometry and aggregate columns never used as predictors
pub const EXCLUDED_COLUMNS: [&str; 6] = ["FID", "Shape", "ROADNAME", "EMD_CD", "ACCIDENTS", "ROADNO"];

/// Marker shared by every accident-count column
const ACCIDENTS_MARKER: &str = "ACCIDENTS_";

/// `(before, after)` target column names for a version
pub fn target_columns(version: &str) -> (String, String) {
    (
        format!("ACCIDENTS_BEFOREINSTALLATION_{}", version),
        format!("ACCIDENTS_AFTERINSTALLATION_{}", version),
    )
}

/// Stacked dataset: rows `0..n` are "before", rows `n..2n` are "after"
#[derive(Debug, Clone)]
pub struct BeforeAfterDataset {
    pub version: String,
    pub features: FeatureMatrix,
    pub targets: TargetVector,
    /// Rows in the source table (half of the stacked rows)
    pub n_source_rows: usize,
}

/// Build the stacked before/after dataset for `version`.
///
/// Fails with [`ZinbError::SchemaError`] listing exactly the target columns
/// that are missing.
pub fn build_before_after(df: &DataFrame, version: &str) -> Result<BeforeAfterDataset> {
    let (target_before, target_after) = target_columns(version);
    let column_names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect();

    let missing: Vec<String> = [&target_before, &target_after]
        .into_iter()
        .filter(|target| !column_names.contains(*target))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(ZinbError::SchemaError {
            version: version.to_string(),
            missing,
        });
    }

    // An input `Is_After` column is replaced by the stacking indicator
    let feature_names: Vec<String> = column_names
        .iter()
        .filter(|name| {
            !EXCLUDED_COLUMNS.contains(&name.as_str())
                && !name.contains(ACCIDENTS_MARKER)
                && name.as_str() != IS_AFTER_COLUMN
        })
        .cloned()
        .collect();
    debug!(
        version,
        kept = feature_names.len(),
        dropped = column_names.len() - feature_names.len(),
        "selected feature columns"
    );

    let base = columns_to_array2(df, &feature_names)?;
    let y_before = target_to_array1(df, &target_before)?;
    let y_after = target_to_array1(df, &target_after)?;

    let n = df.height();
    let x_before = with_indicator(&base, 0.0)?;
    let x_after = with_indicator(&base, 1.0)?;
    let x = concatenate(Axis(0), &[x_before.view(), x_after.view()])?;
    let y = concatenate(Axis(0), &[y_before.view(), y_after.view()])?;

    let mut names = feature_names;
    names.push(IS_AFTER_COLUMN.to_string());

    Ok(BeforeAfterDataset {
        version: version.to_string(),
        features: FeatureMatrix::new(names, x)?,
        targets: TargetVector::new(y)?,
        n_source_rows: n,
    })
}

fn with_indicator(base: &Array2<f64>, value: f64) -> Result<Array2<f64>> {
    let indicator = Array2::from_elem((base.nrows(), 1), value);
    Ok(concatenate(Axis(1), &[base.view(), indicator.view()])?)
}

fn is_text(dtype: &DataType) -> bool {
    matches!(dtype, DataType::String)
}

/// Extract named numeric columns into a row-major matrix; nulls become 0.0
fn columns_to_array2(df: &DataFrame, col_names: &[String]) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let n_cols = col_names.len();

    let col_data: Vec<Vec<f64>> = col_names
        .iter()
        .map(|col_name| {
            let column = df
                .column(col_name)
                .map_err(|_| ZinbError::DataError(format!("feature column {} not found", col_name)))?;
            if is_text(column.dtype()) {
                return Err(ZinbError::DataError(format!(
                    "feature column {} has non-numeric type {}",
                    col_name,
                    column.dtype()
                )));
            }
            let column_f64 = column.cast(&DataType::Float64)?;
            let values: Vec<f64> = column_f64
                .f64()?
                .into_iter()
                .map(|v| v.unwrap_or(0.0))
                .collect();
            Ok(values)
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    let col_refs: Vec<&[f64]> = col_data.iter().map(|c| c.as_slice()).collect();
    Ok(Array2::from_shape_fn((n_rows, n_cols), |(r, c)| col_refs[c][r]))
}

/// Extract a count column; missing or non-numeric values are rejected
fn target_to_array1(df: &DataFrame, name: &str) -> Result<Array1<f64>> {
    let column = df.column(name)?;
    if is_text(column.dtype()) {
        return Err(ZinbError::DataError(format!(
            "target column {} has non-numeric type {}",
            name,
            column.dtype()
        )));
    }
    let column_f64 = column.cast(&DataType::Float64)?;
    column_f64
        .f64()?
        .into_iter()
        .enumerate()
        .map(|(i, v)| {
            v.ok_or_else(|| ZinbError::DataError(format!("target column {} is null at row {}", name, i)))
        })
        .collect::<Result<Vec<f64>>>()
        .map(Array1::from)
}
