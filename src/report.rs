//! Ranked feature-importance CSV reports

use polars::prelude::*;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::explainability::ImportanceReport;
use crate::utils::DataSaver;

/// `feature_importance_<VERSION>.csv`
pub fn report_file_name(version: &str) -> String {
    format!("feature_importance_{}.csv", version)
}

/// Two-column frame `Feature`, `Importance` in report order
pub fn importance_frame(report: &ImportanceReport) -> Result<DataFrame> {
    let features: Vec<&str> = report.records.iter().map(|r| r.feature.as_str()).collect();
    let scores: Vec<f64> = report.records.iter().map(|r| r.importance).collect();
    Ok(df!(
        "Feature" => features,
        "Importance" => scores,
    )?)
}

/// Write the report for `version` into `output_dir` and return the file path
pub fn write_importance_csv(report: &ImportanceReport, output_dir: &Path, version: &str) -> Result<PathBuf> {
    let path = output_dir.join(report_file_name(version));
    let mut frame = importance_frame(report)?;
    DataSaver::save_csv(&mut frame, &path, true)?;
    Ok(path)
}
