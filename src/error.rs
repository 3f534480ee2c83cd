//! Error taxonomy for the fitting engine and the `dfit` binary.
//!
//! Every variant maps to a process exit code, following the same convention
//! throughout the crate:
//!
//! - `2`: configuration or input problems (raised before any fitting work)
//! - `3`: not enough data to fit what was requested
//! - `4`: a numerical fit could not be completed

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FitError {
    #[error("Distribution family '{0}' is unknown.")]
    UnknownFamily(String),

    #[error("Function '{0}' is unknown.")]
    UnknownFunction(String),

    #[error(
        "Parameter '{parameter}' in dimension {dimension} depends on dimension {target}, \
         but neither number_of_intervals nor width_of_intervals is specified for dimension {target}."
    )]
    MissingIntervalSpacing {
        dimension: usize,
        parameter: String,
        target: usize,
    },

    #[error(
        "Dimension {dimension} specifies both number_of_intervals and width_of_intervals; \
         exactly one is allowed."
    )]
    ConflictingIntervalSpacing { dimension: usize },

    #[error("Invalid interval spacing for dimension {dimension}: {reason}")]
    InvalidIntervalSpacing { dimension: usize, reason: String },

    #[error("Parameter '{parameter}' in dimension {dimension} is dependent but no dependency function is given.")]
    MissingFunction { dimension: usize, parameter: String },

    #[error("Parameter '{parameter}' in dimension {dimension} depends on dimension {target}, but only {n_dims} dimensions exist.")]
    InvalidDependency {
        dimension: usize,
        parameter: String,
        target: usize,
        n_dims: usize,
    },

    #[error("KernelDensity cannot be conditional (dimension {dimension}).")]
    KernelDensityConditional { dimension: usize },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Cannot fit {family} to sample: {reason}")]
    InvalidSample { family: String, reason: String },

    #[error(
        "Your settings resulted in {produced} intervals for dimension {dimension}. However, at least \
         {required} intervals are required. Consider changing the interval width setting."
    )]
    InsufficientIntervals {
        dimension: usize,
        produced: usize,
        required: usize,
    },

    #[error("Can't fit curve for parameter '{parameter}' in dimension {dimension}. Number of iterations exceeded.")]
    CurveFit { parameter: String, dimension: usize },

    #[error("Failed to access '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl FitError {
    pub fn exit_code(&self) -> u8 {
        match self {
            FitError::UnknownFamily(_)
            | FitError::UnknownFunction(_)
            | FitError::MissingIntervalSpacing { .. }
            | FitError::ConflictingIntervalSpacing { .. }
            | FitError::InvalidIntervalSpacing { .. }
            | FitError::MissingFunction { .. }
            | FitError::InvalidDependency { .. }
            | FitError::KernelDensityConditional { .. }
            | FitError::InvalidInput(_)
            | FitError::Io { .. }
            | FitError::Parse(_) => 2,
            FitError::InvalidSample { .. } | FitError::InsufficientIntervals { .. } => 3,
            FitError::CurveFit { .. } => 4,
        }
    }

    /// Whether this error only invalidates a single interval fit.
    ///
    /// The interval partitioner drops intervals that fail this way instead of
    /// aborting the whole partition.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, FitError::InvalidSample { .. })
    }

    pub(crate) fn invalid_sample(family: impl Into<String>, reason: impl Into<String>) -> Self {
        FitError::InvalidSample {
            family: family.into(),
            reason: reason.into(),
        }
    }
}
