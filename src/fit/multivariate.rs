//! Joint fitting of all dimensions.
//!
//! A [`FitPlan`] is built once from the descriptors and validated up front, so
//! every configuration problem surfaces before any fitting work. The plan is
//! then shared read-only by one rayon task per dimension. Dimension fits only
//! read raw samples (never other dimensions' fitted distributions), so the
//! tasks are independent.

use rayon::prelude::*;
use serde::Serialize;

use crate::domain::{DistributionDescriptor, IntervalSpacing, ParamSlot};
use crate::error::FitError;
use crate::fit::curve::CurveFitOptions;
use crate::fit::dimension::{DimensionFit, fit_dimension};
use crate::fit::inspection::FitInspection;
use crate::fit::interval::validate_spacing;
use crate::fit::marginal::MarginalOptions;
use crate::models::JointDistribution;

/// Options shared by every dimension fit.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FitOptions {
    pub marginal: MarginalOptions,
    pub curve: CurveFitOptions,
}

/// Validated, immutable fitting instructions.
#[derive(Debug, Clone)]
pub struct FitPlan {
    descriptors: Vec<DistributionDescriptor>,
    options: FitOptions,
}

impl FitPlan {
    /// Validate `descriptors` (one per dimension).
    pub fn new(descriptors: Vec<DistributionDescriptor>, options: FitOptions) -> Result<Self, FitError> {
        if descriptors.is_empty() {
            return Err(FitError::InvalidInput("at least one distribution descriptor is required".to_string()));
        }
        let n_dims = descriptors.len();

        for (dimension, descriptor) in descriptors.iter().enumerate() {
            if let Some(spacing) = descriptor.spacing {
                validate_spacing(spacing, dimension)?;
            }

            if !descriptor.family.is_parametric() && descriptor.is_conditional() {
                return Err(FitError::KernelDensityConditional { dimension });
            }

            for slot in ParamSlot::ALL {
                let Some(target) = descriptor.dependency[slot.index()] else {
                    continue;
                };
                let parameter = slot.label(descriptor.family).to_string();
                if target >= n_dims {
                    return Err(FitError::InvalidDependency {
                        dimension,
                        parameter,
                        target,
                        n_dims,
                    });
                }
                if descriptor.functions[slot.index()].is_none() {
                    return Err(FitError::MissingFunction { dimension, parameter });
                }
                if descriptors[target].spacing.is_none() {
                    return Err(FitError::MissingIntervalSpacing {
                        dimension,
                        parameter,
                        target,
                    });
                }
            }
        }

        Ok(Self { descriptors, options })
    }

    pub fn dimensions(&self) -> usize {
        self.descriptors.len()
    }

    pub fn descriptor(&self, dimension: usize) -> Option<&DistributionDescriptor> {
        self.descriptors.get(dimension)
    }

    pub fn descriptors(&self) -> &[DistributionDescriptor] {
        &self.descriptors
    }

    /// Interval spacing of `dimension`, used when other dimensions depend on it.
    pub fn spacing(&self, dimension: usize) -> Option<IntervalSpacing> {
        self.descriptors.get(dimension).and_then(|d| d.spacing)
    }

    pub fn options(&self) -> &FitOptions {
        &self.options
    }

    /// Fit every dimension of `samples` in parallel.
    ///
    /// All dimension tasks run to completion; the first error in dimension
    /// order is returned.
    pub fn fit(&self, samples: &[Vec<f64>]) -> Result<Fit, FitError> {
        validate_samples(samples, self.dimensions())?;
        tracing::info!(
            dimensions = self.dimensions(),
            observations = samples[0].len(),
            "fitting joint distribution"
        );

        let results: Vec<Result<DimensionFit, FitError>> = (0..self.dimensions())
            .into_par_iter()
            .map(|dimension| fit_dimension(dimension, samples, self))
            .collect();
        let fits = results.into_iter().collect::<Result<Vec<_>, _>>()?;

        let mut interval_counts = vec![1usize; fits.len()];
        for fit in &fits {
            for (target, used) in fit.dependency.iter().zip(&fit.used_number_of_intervals) {
                if let (Some(target), Some(used)) = (target, used) {
                    interval_counts[*target] = *used;
                }
            }
        }

        let mut distributions = Vec::with_capacity(fits.len());
        let mut dependencies = Vec::with_capacity(fits.len());
        let mut inspection = Vec::with_capacity(fits.len());
        for fit in fits {
            tracing::info!(
                dimension = fit.inspection.dimension,
                family = %fit.distribution.family(),
                intervals = fit.inspection.used_number_of_intervals,
                "fitted dimension"
            );
            distributions.push(fit.distribution);
            dependencies.push(fit.dependency);
            inspection.push(fit.inspection);
        }

        Ok(Fit {
            joint: JointDistribution::new(distributions, dependencies)?,
            inspection,
            interval_counts,
        })
    }
}

/// Result of a joint fit.
#[derive(Debug, Clone, Serialize)]
pub struct Fit {
    pub joint: JointDistribution,
    /// One record per dimension.
    pub inspection: Vec<FitInspection>,
    /// Per dimension: the number of intervals it was split into when other
    /// dimensions depend on it, 1 otherwise.
    pub interval_counts: Vec<usize>,
}

/// Fit a joint distribution with default options.
pub fn fit(samples: &[Vec<f64>], descriptors: &[DistributionDescriptor]) -> Result<Fit, FitError> {
    fit_with_options(samples, descriptors, FitOptions::default())
}

pub fn fit_with_options(
    samples: &[Vec<f64>],
    descriptors: &[DistributionDescriptor],
    options: FitOptions,
) -> Result<Fit, FitError> {
    if samples.len() != descriptors.len() {
        return Err(FitError::InvalidInput(format!(
            "{} sample dimensions but {} distribution descriptors",
            samples.len(),
            descriptors.len()
        )));
    }
    FitPlan::new(descriptors.to_vec(), options)?.fit(samples)
}

fn validate_samples(samples: &[Vec<f64>], dimensions: usize) -> Result<(), FitError> {
    if samples.len() != dimensions {
        return Err(FitError::InvalidInput(format!(
            "{} sample dimensions but {dimensions} distribution descriptors",
            samples.len()
        )));
    }
    let n = samples.first().map_or(0, Vec::len);
    if n == 0 {
        return Err(FitError::InvalidInput("samples are empty".to_string()));
    }
    for (dimension, sample) in samples.iter().enumerate() {
        if sample.len() != n {
            return Err(FitError::InvalidInput(format!(
                "dimension {dimension} has {} samples, dimension 0 has {n}",
                sample.len()
            )));
        }
        if sample.iter().any(|v| !v.is_finite()) {
            return Err(FitError::InvalidInput(format!(
                "dimension {dimension} contains non-finite samples"
            )));
        }
    }
    Ok(())
}
