//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - runs the fit pipeline or the sample generator
//! - prints reports
//! - writes optional exports

use clap::Parser;

use crate::cli::{Command, FitArgs, SampleArgs};
use crate::data::{SampleConfig, generate_wave_sample};
use crate::error::FitError;
use crate::fit::{CurveFitOptions, FitOptions, MarginalOptions};
use crate::io::write_samples_csv;

pub mod pipeline;

use pipeline::FitConfig;

/// Entry point for the `dfit` binary.
pub fn run() -> Result<(), FitError> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Fit(args) => handle_fit(&args),
        Command::Sample(args) => handle_sample(&args),
    }
}

fn handle_fit(args: &FitArgs) -> Result<(), FitError> {
    let config = fit_config_from_args(args);
    let run = pipeline::run_fit(&config)?;
    println!("{}", crate::report::format_run_summary(&run.samples, &run.fit));
    Ok(())
}

fn handle_sample(args: &SampleArgs) -> Result<(), FitError> {
    let set = generate_wave_sample(&SampleConfig {
        count: args.n,
        seed: args.seed,
    })?;
    write_samples_csv(&args.out, &set)?;
    tracing::info!(path = %args.out.display(), n = args.n, seed = args.seed, "wrote sample");
    Ok(())
}

pub fn fit_config_from_args(args: &FitArgs) -> FitConfig {
    FitConfig {
        samples_path: args.samples.clone(),
        descriptors_path: args.descriptors.clone(),
        export_path: args.export.clone(),
        options: FitOptions {
            marginal: MarginalOptions {
                kde_grid_size: args.kde_grid_size,
            },
            curve: CurveFitOptions {
                max_evaluations: args.max_evaluations,
                retry_max_evaluations: args.retry_max_evaluations,
                ..CurveFitOptions::default()
            },
        },
    }
}
