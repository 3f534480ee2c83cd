//! Fitting a single dimension of the joint distribution.
//!
//! Slots are visited in the order shape, loc, scale:
//!
//! - all independent slots share one fit over the full sample
//! - all slots depending on the same dimension share one partition of that
//!   dimension; each then gets its own dependency curve
//!
//! The sigma/mu lognormal stores `mu = ln(scale)` in the scale slot, both for
//! constants and for the per-interval values its curve is fitted to.

use crate::domain::{Family, ParamSlot};
use crate::error::FitError;
use crate::fit::curve::fit_dependency;
use crate::fit::inspection::{FitInspection, SlotInspection};
use crate::fit::interval::partition;
use crate::fit::marginal::{MarginalFit, fit_basic, fit_marginal};
use crate::fit::multivariate::FitPlan;
use crate::models::{MarginalDistribution, ParamValue, ParametricDistribution};

/// The fitted distribution of one dimension plus diagnostics.
#[derive(Debug, Clone)]
pub struct DimensionFit {
    pub distribution: MarginalDistribution,
    pub dependency: [Option<usize>; 3],
    /// Intervals used per dependent slot.
    pub used_number_of_intervals: [Option<usize>; 3],
    pub inspection: FitInspection,
}

/// Fit dimension `dimension` of `samples` as described by `plan`.
pub fn fit_dimension(
    dimension: usize,
    samples: &[Vec<f64>],
    plan: &FitPlan,
) -> Result<DimensionFit, FitError> {
    let descriptor = plan
        .descriptor(dimension)
        .ok_or_else(|| FitError::InvalidInput(format!("no descriptor for dimension {dimension}")))?;
    let sample = samples
        .get(dimension)
        .ok_or_else(|| FitError::InvalidInput(format!("no samples for dimension {dimension}")))?;
    let family = descriptor.family;
    let options = plan.options();

    if !family.is_parametric() {
        if descriptor.is_conditional() {
            return Err(FitError::KernelDensityConditional { dimension });
        }
        let MarginalFit::KernelDensity(kde) = fit_marginal(sample, family, &options.marginal)? else {
            return Err(FitError::InvalidInput(format!(
                "expected a kernel density for dimension {dimension}"
            )));
        };
        tracing::debug!(dimension, bandwidth = kde.bandwidth(), "fitted kernel density");
        return Ok(DimensionFit {
            distribution: MarginalDistribution::KernelDensity(kde),
            dependency: descriptor.dependency,
            used_number_of_intervals: [None; 3],
            inspection: FitInspection::empty(dimension),
        });
    }

    let mut params: [Option<ParamValue>; 3] = [None; 3];
    let mut used = [None; 3];
    let mut inspection = FitInspection::empty(dimension);

    for slot in ParamSlot::ALL {
        let i = slot.index();
        if params[i].is_some() {
            continue;
        }

        match descriptor.dependency[i] {
            None => {
                let basic = fit_basic(sample, family, &options.marginal)?;
                for other in ParamSlot::ALL.into_iter().skip(i) {
                    let j = other.index();
                    if descriptor.dependency[j].is_some() {
                        continue;
                    }
                    let mut value = ParamValue::constant(basic.param(other));
                    if family == Family::LognormalSigmaMu && other == ParamSlot::Scale {
                        value = value.map_constant(f64::ln);
                    }
                    params[j] = Some(value);
                    inspection.slots[j] = SlotInspection::independent(basic.clone());
                }
            }
            Some(target) => {
                let spacing = plan.spacing(target).ok_or_else(|| FitError::MissingIntervalSpacing {
                    dimension,
                    parameter: slot.label(family).to_string(),
                    target,
                })?;
                let covariate = samples.get(target).ok_or_else(|| FitError::InvalidDependency {
                    dimension,
                    parameter: slot.label(family).to_string(),
                    target,
                    n_dims: samples.len(),
                })?;
                let intervals =
                    partition(sample, covariate, spacing, family, target, &options.marginal)?;

                for other in ParamSlot::ALL.into_iter().skip(i) {
                    let j = other.index();
                    if descriptor.dependency[j] != Some(target) {
                        continue;
                    }
                    let parameter = other.label(family);
                    let function = descriptor.functions[j].ok_or_else(|| FitError::MissingFunction {
                        dimension,
                        parameter: parameter.to_string(),
                    })?;

                    let mut values: Vec<f64> = intervals.fits.iter().map(|f| f.param(other)).collect();
                    if family == Family::LognormalSigmaMu && other == ParamSlot::Scale {
                        values.iter_mut().for_each(|v| *v = v.ln());
                    }

                    let curve = fit_dependency(
                        &intervals.centers,
                        &values,
                        function,
                        parameter,
                        dimension,
                        &options.curve,
                    )?;
                    tracing::debug!(
                        dimension,
                        parameter,
                        target,
                        a = curve.a,
                        b = curve.b,
                        c = curve.c,
                        evaluations = curve.evaluations,
                        "fitted dependency curve"
                    );

                    params[j] = Some(ParamValue::function(function, curve.a, curve.b, curve.c));
                    used[j] = Some(intervals.len());
                    inspection.slots[j] = SlotInspection::dependent(target, &intervals, curve);
                }
            }
        }
    }

    let [Some(shape), Some(loc), Some(scale)] = params else {
        return Err(FitError::InvalidInput(format!(
            "dimension {dimension} left a parameter unassigned"
        )));
    };
    inspection.used_number_of_intervals = used.iter().flatten().copied().max().unwrap_or(1);

    Ok(DimensionFit {
        distribution: MarginalDistribution::Parametric(ParametricDistribution {
            family,
            shape,
            loc,
            scale,
        }),
        dependency: descriptor.dependency,
        used_number_of_intervals: used,
        inspection,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DependencyFunction, DistributionDescriptor, IntervalSpacing};
    use crate::fit::multivariate::FitOptions;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand_distr::{Distribution, Normal, Uniform};

    /// Dimension 0 uniform on [0, 10); dimension 1 normal with mean `1 + 0.2x`
    /// and standard deviation `0.5 + 0.1x`.
    fn samples(n: usize) -> Vec<Vec<f64>> {
        let mut rng = StdRng::seed_from_u64(21);
        let uniform = Uniform::new(0.0, 10.0);
        let unit = Normal::new(0.0, 1.0).unwrap();
        let x: Vec<f64> = (0..n).map(|_| uniform.sample(&mut rng)).collect();
        let y = x
            .iter()
            .map(|&v| 1.0 + 0.2 * v + (0.5 + 0.1 * v) * unit.sample(&mut rng))
            .collect();
        vec![x, y]
    }

    fn plan(second: DistributionDescriptor) -> FitPlan {
        let first = DistributionDescriptor::new(Family::Normal).with_intervals(IntervalSpacing::Count(8));
        FitPlan::new(vec![first, second], FitOptions::default()).unwrap()
    }

    #[test]
    fn independent_slots_share_one_fit() {
        let data = samples(500);
        let plan = plan(DistributionDescriptor::new(Family::Normal));
        let fit = fit_dimension(0, &data, &plan).unwrap();
        let inspection = &fit.inspection;
        assert_eq!(inspection.used_number_of_intervals, 1);
        assert_eq!(fit.used_number_of_intervals, [None; 3]);
        for slot in ParamSlot::ALL {
            assert_eq!(inspection.slot(slot).fits.len(), 1);
            assert_eq!(inspection.slot(slot).fits[0].samples.len(), 500);
        }
        let dist = fit.distribution.as_parametric().unwrap();
        assert_eq!(dist.shape, ParamValue::constant(0.0));
    }

    #[test]
    fn slots_on_the_same_target_share_intervals() {
        let data = samples(2000);
        let plan = plan(
            DistributionDescriptor::new(Family::Normal)
                .depends(ParamSlot::Loc, 0, DependencyFunction::Power)
                .depends(ParamSlot::Scale, 0, DependencyFunction::Power),
        );
        let fit = fit_dimension(1, &data, &plan).unwrap();
        let loc = fit.inspection.slot(ParamSlot::Loc);
        let scale = fit.inspection.slot(ParamSlot::Scale);
        assert_eq!(loc.centers, scale.centers);
        assert_eq!(loc.centers.len(), 8);
        assert_eq!(fit.used_number_of_intervals, [None, Some(8), Some(8)]);
        assert_eq!(fit.inspection.used_number_of_intervals, 8);

        let dist = fit.distribution.as_parametric().unwrap();
        assert!((dist.loc.at(5.0) - 2.0).abs() < 0.15, "{:?}", dist.loc);
        assert!((dist.scale.at(5.0) - 1.0).abs() < 0.15, "{:?}", dist.scale);
        // The shape slot stays independent.
        assert_eq!(fit.inspection.slot(ParamSlot::Shape).fits.len(), 1);
    }

    #[test]
    fn sigma_mu_lognormal_stores_log_scale() {
        let mut data = samples(500);
        data[1] = data[1].iter().map(|v| v.abs() + 0.1).collect();
        let plan = plan(DistributionDescriptor::new(Family::LognormalSigmaMu));
        let fit = fit_dimension(1, &data, &plan).unwrap();
        let dist = fit.distribution.as_parametric().unwrap();
        let fitted_scale = fit.inspection.slot(ParamSlot::Scale).fits[0].scale;
        assert!((dist.scale.at(0.0) - fitted_scale.ln()).abs() < 1e-12);
        let params = dist.parameters([None; 3]).unwrap();
        assert!((params.scale - fitted_scale).abs() < 1e-9);
    }

    #[test]
    fn kernel_density_dimension() {
        let data = samples(300);
        let plan = plan(DistributionDescriptor::new(Family::KernelDensity));
        let fit = fit_dimension(1, &data, &plan).unwrap();
        assert_eq!(fit.distribution.family(), Family::KernelDensity);
        assert_eq!(fit.inspection.used_number_of_intervals, 1);
        assert!(fit.inspection.slots.iter().all(|s| s.fits.is_empty()));
    }
}
