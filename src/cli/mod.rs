//! Command-line parsing for the `dfit` conditional distribution fitter.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the fitting code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::fit::CurveFitOptions;
use crate::math::DEFAULT_GRID_SIZE;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "dfit", version, about = "Conditional-parameter distribution fitter")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit a joint distribution to a sample CSV, print a summary, and optionally export JSON.
    Fit(FitArgs),
    /// Write a synthetic wave height / peak period sample CSV.
    Sample(SampleArgs),
}

/// Options for fitting.
#[derive(Debug, Parser, Clone)]
pub struct FitArgs {
    /// Sample CSV (header row, one column per dimension).
    #[arg(long, value_name = "CSV")]
    pub samples: PathBuf,

    /// Distribution descriptor JSON (one object per dimension).
    #[arg(long, value_name = "JSON")]
    pub descriptors: PathBuf,

    /// Export the fitted joint distribution and inspection data to JSON.
    #[arg(long, value_name = "JSON")]
    pub export: Option<PathBuf>,

    /// Residual evaluations allowed for a dependency curve fit.
    #[arg(long, default_value_t = CurveFitOptions::default().max_evaluations)]
    pub max_evaluations: usize,

    /// Residual evaluations allowed when retrying a curve fit that did not converge.
    #[arg(long, default_value_t = CurveFitOptions::default().retry_max_evaluations)]
    pub retry_max_evaluations: usize,

    /// Support grid size of kernel density estimates.
    #[arg(long, default_value_t = DEFAULT_GRID_SIZE)]
    pub kde_grid_size: usize,
}

/// Options for synthetic sample generation.
#[derive(Debug, Parser, Clone)]
pub struct SampleArgs {
    /// Number of observations.
    #[arg(short = 'n', long, default_value_t = 1000)]
    pub n: usize,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Output CSV path.
    #[arg(long, value_name = "CSV")]
    pub out: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fit_command() {
        let cli = Cli::parse_from([
            "dfit",
            "fit",
            "--samples",
            "s.csv",
            "--descriptors",
            "d.json",
            "--max-evaluations",
            "50",
        ]);
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        assert_eq!(args.samples, PathBuf::from("s.csv"));
        assert_eq!(args.max_evaluations, 50);
        assert_eq!(args.retry_max_evaluations, 1_000_000);
        assert!(args.export.is_none());
    }

    #[test]
    fn parses_sample_command() {
        let cli = Cli::parse_from(["dfit", "sample", "-n", "20", "--out", "x.csv"]);
        let Command::Sample(args) = cli.command else {
            panic!("expected sample");
        };
        assert_eq!((args.n, args.seed), (20, 42));
    }

    #[test]
    fn fit_requires_inputs() {
        assert!(Cli::try_parse_from(["dfit", "fit", "--samples", "s.csv"]).is_err());
    }
}
