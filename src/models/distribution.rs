//! Fitted marginal distributions and the joint distribution built from them.
//!
//! Density evaluation is delegated to `statrs`; this module only resolves the
//! (possibly covariate-dependent) parameters and applies the location shift.

use serde::Serialize;
use statrs::distribution::{Continuous, ContinuousCDF, LogNormal, Normal, Weibull};

use crate::domain::{Family, ParamSlot};
use crate::error::FitError;
use crate::math::KernelDensity;
use crate::models::ParamValue;

/// Parameters resolved at concrete covariate values.
///
/// Always in the (shape, loc, scale) convention: for the sigma/mu lognormal
/// `scale = exp(mu)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Parameters {
    pub shape: f64,
    pub loc: f64,
    pub scale: f64,
}

/// A parametric family with three (constant or function-valued) parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParametricDistribution {
    pub family: Family,
    pub shape: ParamValue,
    pub loc: ParamValue,
    /// For `Lognormal_2` this slot carries `mu`.
    pub scale: ParamValue,
}

enum Evaluator {
    Weibull(Weibull),
    Normal(Normal),
    LogNormal(LogNormal),
}

impl ParametricDistribution {
    pub fn param(&self, slot: ParamSlot) -> &ParamValue {
        match slot {
            ParamSlot::Shape => &self.shape,
            ParamSlot::Loc => &self.loc,
            ParamSlot::Scale => &self.scale,
        }
    }

    /// Resolve all three parameters; `covariates[i]` feeds slot `i`.
    ///
    /// Returns `None` if a function-valued slot has no covariate.
    pub fn parameters(&self, covariates: [Option<f64>; 3]) -> Option<Parameters> {
        let shape = self.shape.evaluate(covariates[0])?;
        let loc = self.loc.evaluate(covariates[1])?;
        let raw_scale = self.scale.evaluate(covariates[2])?;
        let scale = match self.family {
            Family::LognormalSigmaMu => raw_scale.exp(),
            _ => raw_scale,
        };
        Some(Parameters { shape, loc, scale })
    }

    pub fn pdf(&self, x: f64, covariates: [Option<f64>; 3]) -> Result<f64, FitError> {
        let (evaluator, loc) = self.evaluator(covariates)?;
        let z = x - loc;
        Ok(match evaluator {
            Evaluator::Weibull(d) => d.pdf(z),
            Evaluator::Normal(d) => d.pdf(x),
            Evaluator::LogNormal(d) => d.pdf(z),
        })
    }

    pub fn cdf(&self, x: f64, covariates: [Option<f64>; 3]) -> Result<f64, FitError> {
        let (evaluator, loc) = self.evaluator(covariates)?;
        let z = x - loc;
        Ok(match evaluator {
            Evaluator::Weibull(d) => d.cdf(z),
            Evaluator::Normal(d) => d.cdf(x),
            Evaluator::LogNormal(d) => d.cdf(z),
        })
    }

    pub fn icdf(&self, p: f64, covariates: [Option<f64>; 3]) -> Result<f64, FitError> {
        if !(0.0..=1.0).contains(&p) {
            return Err(FitError::InvalidInput(format!("probability {p} is outside [0, 1]")));
        }
        let (evaluator, loc) = self.evaluator(covariates)?;
        Ok(match evaluator {
            Evaluator::Weibull(d) => d.inverse_cdf(p) + loc,
            Evaluator::Normal(d) => d.inverse_cdf(p),
            Evaluator::LogNormal(d) => d.inverse_cdf(p) + loc,
        })
    }

    fn evaluator(&self, covariates: [Option<f64>; 3]) -> Result<(Evaluator, f64), FitError> {
        let params = self.parameters(covariates).ok_or_else(|| {
            FitError::InvalidInput(format!(
                "{} has a covariate-dependent parameter but no covariate was given",
                self.family
            ))
        })?;
        let invalid = |e: &dyn std::fmt::Display| {
            FitError::InvalidInput(format!(
                "invalid {} parameters (shape={}, loc={}, scale={}): {e}",
                self.family, params.shape, params.loc, params.scale
            ))
        };

        let evaluator = match self.family {
            Family::Weibull => Evaluator::Weibull(
                Weibull::new(params.shape, params.scale).map_err(|e| invalid(&e))?,
            ),
            Family::Normal => Evaluator::Normal(
                Normal::new(params.loc, params.scale).map_err(|e| invalid(&e))?,
            ),
            Family::LognormalShapeScale | Family::LognormalSigmaMu => Evaluator::LogNormal(
                LogNormal::new(params.scale.ln(), params.shape).map_err(|e| invalid(&e))?,
            ),
            Family::KernelDensity => {
                return Err(FitError::InvalidInput(
                    "KernelDensity is not a parametric family".to_string(),
                ));
            }
        };
        Ok((evaluator, params.loc))
    }
}

/// A fitted distribution for one dimension.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MarginalDistribution {
    Parametric(ParametricDistribution),
    KernelDensity(KernelDensity),
}

impl MarginalDistribution {
    pub fn family(&self) -> Family {
        match self {
            MarginalDistribution::Parametric(d) => d.family,
            MarginalDistribution::KernelDensity(_) => Family::KernelDensity,
        }
    }

    pub fn as_parametric(&self) -> Option<&ParametricDistribution> {
        match self {
            MarginalDistribution::Parametric(d) => Some(d),
            MarginalDistribution::KernelDensity(_) => None,
        }
    }

    /// Covariates are ignored by the kernel density.
    pub fn pdf(&self, x: f64, covariates: [Option<f64>; 3]) -> Result<f64, FitError> {
        match self {
            MarginalDistribution::Parametric(d) => d.pdf(x, covariates),
            MarginalDistribution::KernelDensity(k) => Ok(k.pdf(x)),
        }
    }

    pub fn cdf(&self, x: f64, covariates: [Option<f64>; 3]) -> Result<f64, FitError> {
        match self {
            MarginalDistribution::Parametric(d) => d.cdf(x, covariates),
            MarginalDistribution::KernelDensity(k) => Ok(k.cdf(x)),
        }
    }

    pub fn icdf(&self, p: f64, covariates: [Option<f64>; 3]) -> Result<f64, FitError> {
        match self {
            MarginalDistribution::Parametric(d) => d.icdf(p, covariates),
            MarginalDistribution::KernelDensity(k) => Ok(k.icdf(p)),
        }
    }
}

/// Ordered per-dimension distributions plus their dependency triples.
#[derive(Debug, Clone, Serialize)]
pub struct JointDistribution {
    distributions: Vec<MarginalDistribution>,
    dependencies: Vec<[Option<usize>; 3]>,
}

impl JointDistribution {
    pub fn new(
        distributions: Vec<MarginalDistribution>,
        dependencies: Vec<[Option<usize>; 3]>,
    ) -> Result<Self, FitError> {
        if distributions.len() != dependencies.len() {
            return Err(FitError::InvalidInput(format!(
                "{} distributions but {} dependency triples",
                distributions.len(),
                dependencies.len()
            )));
        }
        Ok(Self {
            distributions,
            dependencies,
        })
    }

    pub fn dimensions(&self) -> usize {
        self.distributions.len()
    }

    pub fn distributions(&self) -> &[MarginalDistribution] {
        &self.distributions
    }

    pub fn distribution(&self, dimension: usize) -> Option<&MarginalDistribution> {
        self.distributions.get(dimension)
    }

    pub fn dependencies(&self) -> &[[Option<usize>; 3]] {
        &self.dependencies
    }

    /// Covariate per slot of `dimension`, read from a full point.
    pub fn covariates(&self, dimension: usize, point: &[f64]) -> [Option<f64>; 3] {
        let mut out = [None; 3];
        if let Some(dependency) = self.dependencies.get(dimension) {
            for (slot, dep) in dependency.iter().enumerate() {
                out[slot] = dep.and_then(|d| point.get(d).copied());
            }
        }
        out
    }

    /// Joint density: the product of each dimension's conditional density.
    pub fn pdf(&self, point: &[f64]) -> Result<f64, FitError> {
        if point.len() != self.dimensions() {
            return Err(FitError::InvalidInput(format!(
                "point has {} coordinates, distribution has {} dimensions",
                point.len(),
                self.dimensions()
            )));
        }
        let mut density = 1.0;
        for (dimension, dist) in self.distributions.iter().enumerate() {
            density *= dist.pdf(point[dimension], self.covariates(dimension, point))?;
        }
        Ok(density)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DependencyFunction;

    fn weibull() -> ParametricDistribution {
        ParametricDistribution {
            family: Family::Weibull,
            shape: ParamValue::constant(1.5),
            loc: ParamValue::constant(0.0),
            scale: ParamValue::constant(3.0),
        }
    }

    #[test]
    fn weibull_cdf_matches_closed_form() {
        let d = weibull();
        let x: f64 = 2.0;
        let expected = 1.0 - (-(x / 3.0).powf(1.5)).exp();
        let got = d.cdf(x, [None; 3]).unwrap();
        assert!((got - expected).abs() < 1e-12);
        let back = d.icdf(got, [None; 3]).unwrap();
        assert!((back - x).abs() < 1e-9);
    }

    #[test]
    fn location_shifts_weibull() {
        let mut d = weibull();
        d.loc = ParamValue::constant(5.0);
        let shifted = d.cdf(7.0, [None; 3]).unwrap();
        let base = weibull().cdf(2.0, [None; 3]).unwrap();
        assert!((shifted - base).abs() < 1e-12);
    }

    #[test]
    fn sigma_mu_lognormal_reports_exp_mu_as_scale() {
        let d = ParametricDistribution {
            family: Family::LognormalSigmaMu,
            shape: ParamValue::constant(0.2),
            loc: ParamValue::constant(0.0),
            scale: ParamValue::constant(2.0),
        };
        let params = d.parameters([None; 3]).unwrap();
        assert!((params.scale - 2.0_f64.exp()).abs() < 1e-12);
        let median = d.icdf(0.5, [None; 3]).unwrap();
        assert!((median - 2.0_f64.exp()).abs() < 1e-9);
    }

    #[test]
    fn dependent_parameter_needs_covariate() {
        let d = ParametricDistribution {
            family: Family::LognormalShapeScale,
            shape: ParamValue::constant(0.2),
            loc: ParamValue::constant(0.0),
            scale: ParamValue::function(DependencyFunction::Exponential, 0.1, 1.5, 0.2),
        };
        assert!(d.parameters([None; 3]).is_none());
        assert!(d.pdf(5.0, [None; 3]).is_err());
        let params = d.parameters([None, None, Some(0.0)]).unwrap();
        assert!((params.scale - 1.6).abs() < 1e-12);
    }

    #[test]
    fn joint_pdf_is_product_of_conditionals() {
        let conditional = ParametricDistribution {
            family: Family::Normal,
            shape: ParamValue::constant(0.0),
            loc: ParamValue::function(DependencyFunction::Power, 1.0, 2.0, 1.0),
            scale: ParamValue::constant(1.0),
        };
        let joint = JointDistribution::new(
            vec![
                MarginalDistribution::Parametric(weibull()),
                MarginalDistribution::Parametric(conditional.clone()),
            ],
            vec![[None; 3], [None, Some(0), None]],
        )
        .unwrap();

        let point = [2.0, 4.0];
        let expected = weibull().pdf(2.0, [None; 3]).unwrap()
            * conditional.pdf(4.0, [None, Some(2.0), None]).unwrap();
        assert!((joint.pdf(&point).unwrap() - expected).abs() < 1e-12);
        assert!(joint.pdf(&[1.0]).is_err());
    }
}
