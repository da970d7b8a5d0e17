//! accident-zinb CLI Module
//!
//! Command-line interface for fitting the ZINB model per version and writing
//! the ranked feature-importance reports.

use clap::Parser;
use colored::*;
use std::path::PathBuf;
use std::time::Instant;

use crate::pipeline::{run, PipelineConfig, RunOptions, VersionOutput, DEFAULT_VERSIONS};
use crate::training::TrainingConfig;

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn muted(s: &str) -> ColoredString { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString    { s.truecolor(100, 210, 120) }

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn step_ok(msg: &str) {
    println!("  {} {}", ok("✓"), msg);
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "accident-zinb")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train Zero-Inflated Negative Binomial model.")]
#[command(long_about = None)]
pub struct Cli {
    /// Path to the input data file. You can also set DATA_FILE env var.
    #[arg(long, env = "DATA_FILE")]
    pub data_path: Option<PathBuf>,

    /// Target versions to train
    #[arg(long, num_args = 1.., default_values = DEFAULT_VERSIONS)]
    pub versions: Vec<String>,

    /// Training epochs
    #[arg(long, default_value_t = 500)]
    pub epochs: usize,

    /// Learning rate for the Adam optimizer
    #[arg(long, default_value_t = 1e-3)]
    pub learning_rate: f64,

    /// Directory to save feature importance CSV files
    #[arg(long, default_value = "results")]
    pub output_dir: PathBuf,

    /// Seed for initialisation, split and permutation streams
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Fraction of rows held out for evaluation and importance
    #[arg(long, default_value_t = 0.2)]
    pub test_size: f64,

    /// Log the training loss every N epochs (0 disables)
    #[arg(long, default_value_t = 100)]
    pub log_every: usize,

    /// Number of top features printed per version
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    /// Keep training the remaining versions after one fails
    #[arg(long)]
    pub continue_on_error: bool,
}

impl Cli {
    /// Map the flags onto pipeline options
    pub fn run_options(&self) -> RunOptions {
        let mut config = PipelineConfig::default().with_seed(self.seed);
        config.training = TrainingConfig {
            seed: self.seed,
            ..TrainingConfig::default()
        }
        .with_epochs(self.epochs)
        .with_learning_rate(self.learning_rate)
        .with_log_every(self.log_every);
        config.split.test_size = self.test_size;

        RunOptions {
            data_path: self.data_path.clone(),
            versions: self.versions.clone(),
            output_dir: self.output_dir.clone(),
            config,
            continue_on_error: self.continue_on_error,
        }
    }
}

fn print_version(output: &VersionOutput, top: usize) {
    let report = &output.report;
    section(&format!("ZINB · {}", report.version));
    println!(
        "  {:<16} {}",
        muted("Data shape"),
        format!("{} × {}", report.data_shape.0, report.data_shape.1).white()
    );
    println!("  {:<16} {}", muted("Zeros"), format!("{:.2}%", report.zero_percentage).white());
    println!("  {:<16} {}", muted("Test loss"), format!("{:.4}", report.evaluation.loss).white().bold());
    println!("  {:<16} {}", muted("Test MSE"), format!("{:.4}", report.evaluation.mse).white());
    println!();

    println!("  {:<32} {}", muted("Feature"), muted("Importance"));
    for record in report.importance.top_k(top) {
        println!("  {:<32} {:>10.6}", record.feature, record.importance);
    }
    println!();
    step_ok(&format!("Saved {}", output.path.display()));
}

/// Run every requested version and print a summary
pub fn run_cli(cli: &Cli) -> anyhow::Result<()> {
    let start = Instant::now();
    let options = cli.run_options();
    let summary = run(&options)?;

    for output in &summary.completed {
        print_version(output, cli.top);
    }

    println!();
    println!(
        "  {:<16} {}",
        muted("Total time"),
        format!("{:.2}s", start.elapsed().as_secs_f64()).white()
    );

    if !summary.failed.is_empty() {
        for (version, err) in &summary.failed {
            println!("  {} {}: {}", "✗".red(), version, err);
        }
        anyhow::bail!("{} of {} versions failed", summary.failed.len(), options.versions.len());
    }

    Ok(())
}
