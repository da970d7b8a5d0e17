//! Per-version fit-and-explain pipeline
//!
//! build → split → standardize → train → evaluate → permutation importance

use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::dataset::build_before_after;
use crate::error::{Result, ZinbError};
use crate::explainability::{ImportanceConfig, ImportanceReport, PermutationImportance};
use crate::preprocessing::{train_test_split, SplitConfig, StandardScaler};
use crate::report::write_importance_csv;
use crate::training::{evaluate, Evaluation, Trainer, TrainingConfig};
use crate::utils::DataLoader;

/// Versions trained when none are requested
pub const DEFAULT_VERSIONS: [&str; 2] = ["VERSION1", "VERSION2"];

/// Everything that parameterises one version's run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub training: TrainingConfig,
    pub split: SplitConfig,
    pub importance: ImportanceConfig,
}

impl PipelineConfig {
    /// Use one seed for initialisation, split and permutation streams
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.training.seed = seed;
        self.split.seed = seed;
        self.importance.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.training.validate()?;
        self.split.validate()
    }
}

/// Outcome of one version's run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionReport {
    pub version: String,
    /// Stacked rows x features, including `Is_After`
    pub data_shape: (usize, usize),
    pub zero_percentage: f64,
    pub train_rows: usize,
    pub test_rows: usize,
    pub final_train_loss: f64,
    pub evaluation: Evaluation,
    pub importance: ImportanceReport,
}

/// Fit the ZINB network for `version` and rank its features
pub fn run_version(df: &DataFrame, version: &str, config: &PipelineConfig) -> Result<VersionReport> {
    config.validate()?;
    info!("--- Training ZINB model for {} ---", version);

    let dataset = build_before_after(df, version)?;
    let x = dataset.features.values();
    let y = dataset.targets.values();
    let zero_percentage = dataset.targets.zero_fraction() * 100.0;
    info!(
        "Data shape: ({}, {}), Target shape: ({},)",
        x.nrows(),
        x.ncols(),
        y.len()
    );
    info!("Zero percentage in target: {:.2}%", zero_percentage);

    let split = train_test_split(x.nrows(), &config.split)?;
    let (x_train, x_test, y_train, y_test) = split.apply(x, y);

    let mut scaler = StandardScaler::new();
    let x_train = scaler.fit_transform(&x_train)?;
    let x_test = scaler.transform(&x_test)?;

    let trainer = Trainer::new(config.training.clone(), x_train.ncols())?;
    let model = trainer.fit(&x_train, &y_train)?;
    let final_train_loss = model.final_loss().unwrap_or(f64::NAN);

    let evaluation = evaluate(model.network(), &x_test, &y_test)?;
    info!("Final test loss: {:.4}", evaluation.loss);
    info!("Test MSE: {:.4}", evaluation.mse);

    info!("Calculating permutation feature importance...");
    let importance = PermutationImportance::new(config.importance.clone()).compute_from_baseline(
        model.network(),
        &x_test,
        &y_test,
        dataset.features.names(),
        evaluation.loss,
    )?;

    Ok(VersionReport {
        version: version.to_string(),
        data_shape: (x.nrows(), x.ncols()),
        zero_percentage,
        train_rows: x_train.nrows(),
        test_rows: x_test.nrows(),
        final_train_loss,
        evaluation,
        importance,
    })
}

/// Options for a multi-version run
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub data_path: Option<PathBuf>,
    pub versions: Vec<String>,
    pub output_dir: PathBuf,
    pub config: PipelineConfig,
    /// Keep going after a version fails
    pub continue_on_error: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            data_path: None,
            versions: DEFAULT_VERSIONS.iter().map(|v| v.to_string()).collect(),
            output_dir: PathBuf::from("results"),
            config: PipelineConfig::default(),
            continue_on_error: false,
        }
    }
}

/// A version's report and the CSV written for it
#[derive(Debug, Clone)]
pub struct VersionOutput {
    pub report: VersionReport,
    pub path: PathBuf,
}

/// Result of a multi-version run
#[derive(Debug, Default)]
pub struct RunSummary {
    pub completed: Vec<VersionOutput>,
    pub failed: Vec<(String, ZinbError)>,
}

/// Load the data once, then run and report every requested version
pub fn run(options: &RunOptions) -> Result<RunSummary> {
    let data_path = options.data_path.as_ref().ok_or_else(|| {
        ZinbError::ConfigError("Missing --data-path (or DATA_FILE environment variable).".to_string())
    })?;
    options.config.validate()?;

    let df = DataLoader::new().load_auto(data_path)?;
    std::fs::create_dir_all(&options.output_dir)?;

    let mut summary = RunSummary::default();
    for version in &options.versions {
        let outcome = run_version(&df, version, &options.config).and_then(|report| {
            let path = write_importance_csv(&report.importance, &options.output_dir, version)?;
            info!("Saved: {}", path.display());
            Ok(VersionOutput { report, path })
        });

        match outcome {
            Ok(output) => summary.completed.push(output),
            Err(err) if options.continue_on_error => {
                warn!(version = %version, error = %err, "version failed, continuing");
                summary.failed.push((version.clone(), err));
            }
            Err(err) => return Err(err),
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_data_path_is_config_error() {
        let err = run(&RunOptions::default()).unwrap_err();
        assert!(matches!(err, ZinbError::ConfigError(_)));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let options = RunOptions {
            data_path: Some(PathBuf::from("/no/such/file.csv")),
            ..Default::default()
        };
        assert!(matches!(run(&options).unwrap_err(), ZinbError::NotFound(_)));
    }

    #[test]
    fn test_with_seed_sets_all_streams() {
        let config = PipelineConfig::default().with_seed(7);
        assert_eq!(config.training.seed, 7);
        assert_eq!(config.split.seed, 7);
        assert_eq!(config.importance.seed, 7);
    }
}
