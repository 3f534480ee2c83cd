//! Marginal fitting: one family, one sample, no covariates.
//!
//! Families:
//!
//! - Weibull: three-parameter maximum likelihood with a free location
//! - Normal: sample mean and (population) standard deviation; shape is fixed at 0
//! - Lognormal: location fixed at 0, `σ = std(ln x)`, `scale = exp(mean(ln x))`
//! - KernelDensity: Gaussian kernel density estimate
//!
//! The Weibull location is found by profiling the likelihood. For a fixed
//! location `θ` and `y = x - θ`, the two-parameter MLE shape solves
//!
//! ```text
//! Σ y^k ln y / Σ y^k - 1/k - mean(ln y) = 0
//! ```
//!
//! and the scale follows as `(mean y^k)^(1/k)`. We evaluate the profile
//! likelihood on a log-spaced grid of offsets below the sample minimum (in
//! parallel), then refine around the best grid point by golden-section search.

use rayon::prelude::*;
use statrs::statistics::Statistics;

use crate::domain::{BasicFit, Family};
use crate::error::FitError;
use crate::math::{DEFAULT_GRID_SIZE, KernelDensity};

/// Options for a single marginal fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarginalOptions {
    /// Support grid size of kernel density estimates.
    pub kde_grid_size: usize,
}

impl Default for MarginalOptions {
    fn default() -> Self {
        Self {
            kde_grid_size: DEFAULT_GRID_SIZE,
        }
    }
}

/// Result of fitting one family to one sample.
#[derive(Debug, Clone)]
pub enum MarginalFit {
    Parametric { shape: f64, loc: f64, scale: f64 },
    KernelDensity(KernelDensity),
}

/// Fit `family` to `sample`.
///
/// Returns [`FitError::InvalidSample`] when the sample cannot support the
/// family (too short, zero spread, non-positive values for a lognormal).
pub fn fit_marginal(
    sample: &[f64],
    family: Family,
    options: &MarginalOptions,
) -> Result<MarginalFit, FitError> {
    if sample.is_empty() {
        return Err(FitError::invalid_sample(family.name(), "sample is empty"));
    }
    if sample.iter().any(|v| !v.is_finite()) {
        return Err(FitError::invalid_sample(family.name(), "sample contains non-finite values"));
    }

    let (shape, loc, scale) = match family {
        Family::Weibull => fit_weibull(sample)?,
        Family::Normal => fit_normal(sample)?,
        Family::LognormalShapeScale | Family::LognormalSigmaMu => fit_lognormal(sample, family)?,
        Family::KernelDensity => {
            return KernelDensity::fit(sample, options.kde_grid_size).map(MarginalFit::KernelDensity);
        }
    };
    Ok(MarginalFit::Parametric { shape, loc, scale })
}

/// Fit a parametric family and keep the sample alongside the parameters.
pub fn fit_basic(
    sample: &[f64],
    family: Family,
    options: &MarginalOptions,
) -> Result<BasicFit, FitError> {
    match fit_marginal(sample, family, options)? {
        MarginalFit::Parametric { shape, loc, scale } => Ok(BasicFit {
            shape,
            loc,
            scale,
            samples: sample.to_vec(),
        }),
        MarginalFit::KernelDensity(_) => Err(FitError::InvalidInput(format!(
            "{family} has no (shape, loc, scale) parameters"
        ))),
    }
}

fn fit_normal(sample: &[f64]) -> Result<(f64, f64, f64), FitError> {
    if sample.len() < 2 {
        return Err(FitError::invalid_sample("Normal", "at least 2 samples are required"));
    }
    let mean = sample.iter().mean();
    let std = sample.iter().population_std_dev();
    if !(std.is_finite() && std > 0.0) {
        return Err(FitError::invalid_sample("Normal", "sample has zero spread"));
    }
    Ok((0.0, mean, std))
}

fn fit_lognormal(sample: &[f64], family: Family) -> Result<(f64, f64, f64), FitError> {
    if sample.len() < 2 {
        return Err(FitError::invalid_sample(family.name(), "at least 2 samples are required"));
    }
    if sample.iter().any(|&v| v <= 0.0) {
        return Err(FitError::invalid_sample(
            family.name(),
            "lognormal samples must be strictly positive",
        ));
    }
    let logs: Vec<f64> = sample.iter().map(|v| v.ln()).collect();
    let mu = logs.iter().mean();
    let sigma = logs.iter().population_std_dev();
    if !(sigma.is_finite() && sigma > 0.0) {
        return Err(FitError::invalid_sample(family.name(), "sample has zero spread"));
    }
    Ok((sigma, 0.0, mu.exp()))
}

const OFFSET_EXP_MIN: f64 = -4.0;
const OFFSET_EXP_MAX: f64 = 1.0;
const OFFSET_GRID_STEPS: usize = 41;
const GOLDEN_ITERS: usize = 60;

fn fit_weibull(sample: &[f64]) -> Result<(f64, f64, f64), FitError> {
    if sample.len() < 3 {
        return Err(FitError::invalid_sample("Weibull", "at least 3 samples are required"));
    }
    let min = sample.iter().copied().fold(f64::INFINITY, f64::min);
    let max = sample.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;
    if !(span > 0.0) {
        return Err(FitError::invalid_sample("Weibull", "sample has zero spread"));
    }

    // Offsets below the minimum are parameterized as `span * 10^u`.
    let loc_at = |u: f64| min - span * 10f64.powf(u);
    let step = (OFFSET_EXP_MAX - OFFSET_EXP_MIN) / (OFFSET_GRID_STEPS as f64 - 1.0);
    let grid: Vec<f64> = (0..OFFSET_GRID_STEPS)
        .map(|i| OFFSET_EXP_MIN + step * i as f64)
        .collect();

    let scored: Vec<(usize, f64)> = grid
        .par_iter()
        .enumerate()
        .map(|(i, &u)| (i, profile(sample, loc_at(u)).map_or(f64::NEG_INFINITY, |p| p.loglik)))
        .collect();

    let (best, best_ll) = scored
        .iter()
        .copied()
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .unwrap_or((0, f64::NEG_INFINITY));
    if !best_ll.is_finite() {
        return Err(FitError::invalid_sample("Weibull", "likelihood is not finite for any location"));
    }

    let lo = grid[best.saturating_sub(1)];
    let hi = grid[(best + 1).min(grid.len() - 1)];
    let u = golden_max(lo, hi, |u| {
        profile(sample, loc_at(u)).map_or(f64::NEG_INFINITY, |p| p.loglik)
    });

    let refined = profile(sample, loc_at(u)).filter(|p| p.loglik >= best_ll);
    let chosen = match refined {
        Some(p) => p,
        None => profile(sample, loc_at(grid[best])).ok_or_else(|| {
            FitError::invalid_sample("Weibull", "likelihood is not finite for any location")
        })?,
    };
    Ok((chosen.shape, chosen.loc, chosen.scale))
}

#[derive(Debug, Clone, Copy)]
struct Profile {
    shape: f64,
    loc: f64,
    scale: f64,
    loglik: f64,
}

/// Two-parameter Weibull MLE of `sample - loc`.
fn profile(sample: &[f64], loc: f64) -> Option<Profile> {
    let y: Vec<f64> = sample.iter().map(|&x| x - loc).collect();
    if y.iter().any(|&v| !(v > 0.0)) {
        return None;
    }
    let n = y.len() as f64;
    let y_max = y.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    // Work on y / max(y) so that y^k stays within [0, 1].
    let ln_y: Vec<f64> = y.iter().map(|v| (v / y_max).ln()).collect();
    let mean_ln = ln_y.iter().sum::<f64>() / n;

    let score = |k: f64| {
        let mut sum_w = 0.0;
        let mut sum_wl = 0.0;
        for &l in &ln_y {
            let w = (k * l).exp();
            sum_w += w;
            sum_wl += w * l;
        }
        sum_wl / sum_w - 1.0 / k - mean_ln
    };

    // The score is increasing in k; bisect on ln k.
    let (mut lo, mut hi) = (1e-3f64.ln(), 1e3f64.ln());
    if score(hi.exp()) < 0.0 {
        lo = hi;
    } else {
        for _ in 0..100 {
            let mid = 0.5 * (lo + hi);
            if score(mid.exp()) < 0.0 {
                lo = mid;
            } else {
                hi = mid;
            }
        }
    }
    let k = (0.5 * (lo + hi)).exp();

    let mean_pow = ln_y.iter().map(|l| (k * l).exp()).sum::<f64>() / n;
    let scale = y_max * mean_pow.powf(1.0 / k);
    let sum_ln_y: f64 = y.iter().map(|v| v.ln()).sum();
    let loglik = n * k.ln() - n * k * scale.ln() + (k - 1.0) * sum_ln_y - n;

    (k.is_finite() && scale.is_finite() && scale > 0.0 && loglik.is_finite()).then_some(Profile {
        shape: k,
        loc,
        scale,
        loglik,
    })
}

/// Maximize a unimodal `f` on `[lo, hi]`.
fn golden_max(mut lo: f64, mut hi: f64, f: impl Fn(f64) -> f64) -> f64 {
    let ratio = (5f64.sqrt() - 1.0) / 2.0;
    let mut x1 = hi - ratio * (hi - lo);
    let mut x2 = lo + ratio * (hi - lo);
    let mut f1 = f(x1);
    let mut f2 = f(x2);
    for _ in 0..GOLDEN_ITERS {
        if f1 < f2 {
            lo = x1;
            x1 = x2;
            f1 = f2;
            x2 = lo + ratio * (hi - lo);
            f2 = f(x2);
        } else {
            hi = x2;
            x2 = x1;
            f2 = f1;
            x1 = hi - ratio * (hi - lo);
            f1 = f(x1);
        }
    }
    0.5 * (lo + hi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand_distr::{Distribution, LogNormal, Normal, Weibull};

    fn draw<D: Distribution<f64>>(dist: D, n: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n).map(|_| dist.sample(&mut rng)).collect()
    }

    fn params(fit: MarginalFit) -> (f64, f64, f64) {
        match fit {
            MarginalFit::Parametric { shape, loc, scale } => (shape, loc, scale),
            MarginalFit::KernelDensity(_) => panic!("expected a parametric fit"),
        }
    }

    #[test]
    fn weibull_recovers_parameters() {
        let sample = draw(Weibull::new(3.0, 1.5).unwrap(), 3000, 7);
        let (shape, loc, scale) =
            params(fit_marginal(&sample, Family::Weibull, &MarginalOptions::default()).unwrap());
        assert!((shape - 1.5).abs() < 0.2, "shape {shape}");
        assert!(loc.abs() < 0.3, "loc {loc}");
        assert!((scale - 3.0).abs() < 0.3, "scale {scale}");
        let min = sample.iter().copied().fold(f64::INFINITY, f64::min);
        assert!(loc < min);
    }

    #[test]
    fn weibull_finds_shifted_location() {
        let sample: Vec<f64> = draw(Weibull::new(2.0, 2.0).unwrap(), 3000, 11)
            .into_iter()
            .map(|v| v + 5.0)
            .collect();
        let (shape, loc, scale) =
            params(fit_marginal(&sample, Family::Weibull, &MarginalOptions::default()).unwrap());
        assert!((loc - 5.0).abs() < 0.4, "loc {loc}");
        assert!((shape - 2.0).abs() < 0.4, "shape {shape}");
        assert!((scale - 2.0).abs() < 0.4, "scale {scale}");
    }

    #[test]
    fn normal_has_zero_shape() {
        let sample = draw(Normal::new(4.0, 2.0).unwrap(), 2000, 3);
        let (shape, loc, scale) =
            params(fit_marginal(&sample, Family::Normal, &MarginalOptions::default()).unwrap());
        assert_eq!(shape, 0.0);
        assert!((loc - 4.0).abs() < 0.15);
        assert!((scale - 2.0).abs() < 0.15);
    }

    #[test]
    fn lognormal_recovers_mu_and_sigma() {
        let sample = draw(LogNormal::new(1.2, 0.3).unwrap(), 2000, 5);
        for family in [Family::LognormalShapeScale, Family::LognormalSigmaMu] {
            let (shape, loc, scale) =
                params(fit_marginal(&sample, family, &MarginalOptions::default()).unwrap());
            assert_eq!(loc, 0.0);
            assert!((shape - 0.3).abs() < 0.02, "sigma {shape}");
            assert!((scale.ln() - 1.2).abs() < 0.03, "mu {}", scale.ln());
        }
    }

    #[test]
    fn lognormal_rejects_non_positive_values() {
        let err = fit_marginal(&[1.0, 2.0, 0.0, 3.0], Family::LognormalShapeScale, &MarginalOptions::default())
            .unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn degenerate_samples_are_recoverable_errors() {
        let opts = MarginalOptions::default();
        for family in [Family::Weibull, Family::Normal, Family::LognormalShapeScale] {
            let err = fit_marginal(&[2.0; 15], family, &opts).unwrap_err();
            assert!(err.is_recoverable(), "{family}: {err}");
            assert!(fit_marginal(&[], family, &opts).unwrap_err().is_recoverable());
        }
    }

    #[test]
    fn kernel_density_fit() {
        let sample = draw(Normal::new(0.0, 1.0).unwrap(), 400, 9);
        let opts = MarginalOptions { kde_grid_size: 500 };
        match fit_marginal(&sample, Family::KernelDensity, &opts).unwrap() {
            MarginalFit::KernelDensity(kde) => {
                assert!((kde.icdf(0.5)).abs() < 0.2);
                assert!((kde.cdf(0.0) - 0.5).abs() < 0.05);
            }
            MarginalFit::Parametric { .. } => panic!("expected a kernel density"),
        }
        assert!(fit_basic(&sample, Family::KernelDensity, &opts).is_err());
    }

    #[test]
    fn basic_fit_keeps_samples() {
        let sample = draw(Normal::new(1.0, 1.0).unwrap(), 50, 1);
        let basic = fit_basic(&sample, Family::Normal, &MarginalOptions::default()).unwrap();
        assert_eq!(basic.samples, sample);
        assert_eq!(basic.shape, 0.0);
    }
}
