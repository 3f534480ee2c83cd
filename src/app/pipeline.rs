//! Shared "fit pipeline" logic.
//!
//! Keeping this in one place keeps the workflow testable without the CLI:
//! load samples -> load descriptors -> plan + fit -> optional export

use std::path::PathBuf;

use crate::error::FitError;
use crate::fit::{Fit, FitOptions, fit_with_options};
use crate::io::{SampleSet, load_descriptors, load_samples, write_fit_json};

/// Resolved configuration of a `dfit fit` run.
#[derive(Debug, Clone)]
pub struct FitConfig {
    pub samples_path: PathBuf,
    pub descriptors_path: PathBuf,
    pub export_path: Option<PathBuf>,
    pub options: FitOptions,
}

/// All computed outputs of a single `dfit fit` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub samples: SampleSet,
    pub fit: Fit,
}

/// Execute the full fitting pipeline and return the computed outputs.
pub fn run_fit(config: &FitConfig) -> Result<RunOutput, FitError> {
    let samples = load_samples(&config.samples_path)?;
    let descriptors = load_descriptors(&config.descriptors_path)?;
    tracing::info!(
        samples = %config.samples_path.display(),
        descriptors = %config.descriptors_path.display(),
        dimensions = samples.dimensions(),
        "loaded inputs"
    );

    let fit = fit_with_options(&samples.samples, &descriptors, config.options)?;

    if let Some(path) = &config.export_path {
        write_fit_json(path, &samples.names, &fit)?;
        tracing::info!(path = %path.display(), "exported fit");
    }

    Ok(RunOutput { samples, fit })
}
